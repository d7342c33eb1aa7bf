//! Property Tests
//!
//! セグメンター・繰り返し上限・記号表・JSON保存の性質を`proptest`で検証します。

use proptest::prelude::*;

use pycompat_matrix::{
    write_tables, Cell, CellParse, ColumnDescriptor, Layout, RetentionPolicy, SecurityConfig,
    SymbolTable, TableSegmenter, Tables,
};

fn cell_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("/".to_string()),
        Just("d".to_string()),
        "[a-z ]{1,6}",
    ]
}

fn rows() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec(cell_text(), 0..12), 0..40)
}

fn columns(include: &[bool]) -> Vec<ColumnDescriptor> {
    include
        .iter()
        .enumerate()
        .map(|(i, &inc)| {
            let letter = (b'c' + i as u8) as char;
            ColumnDescriptor::new(letter, "CPython", "2.7", "2010-07-04", inc)
        })
        .collect()
}

fn parsed(rows: Vec<Vec<String>>) -> Vec<(usize, Vec<CellParse>)> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            (
                i,
                row.into_iter()
                    .map(|text| CellParse::Value(Cell::text(text)))
                    .collect(),
            )
        })
        .collect()
}

proptest! {
    #[test]
    fn values_never_exceed_included_columns(
        rows in rows(),
        include in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        let cols = columns(&include);
        let layout = Layout::new(0, 2, 2 + cols.len());
        let segmenter = TableSegmenter::with_parts(layout, &cols, RetentionPolicy::default());
        let (table, report) = segmenter.segment("Builtins", parsed(rows));

        let included = include.iter().filter(|&&b| b).count();
        let mut entries = 0;
        for subsection in &table {
            for entry in &subsection.entries {
                prop_assert!(entry.values.len() <= included);
                prop_assert_eq!(entry.labels.len(), 2);
                prop_assert_eq!(&entry.subsection, &subsection.name);
                prop_assert!(!entry.is_blank());
                entries += 1;
            }
        }
        prop_assert_eq!(entries, report.entries);
        prop_assert_eq!(report.entries + report.rows_dropped, report.rows_seen);
    }

    #[test]
    fn adjacent_subsections_have_distinct_names(rows in rows()) {
        let cols = columns(&[true, true, false]);
        let segmenter =
            TableSegmenter::with_parts(Layout::new(0, 2, 5), &cols, RetentionPolicy::default());
        let (table, _) = segmenter.segment("Keywords", parsed(rows));
        for pair in table.windows(2) {
            prop_assert_ne!(&pair[0].name, &pair[1].name);
        }
    }

    #[test]
    fn repeat_count_is_capped(n in any::<u64>(), cap in 1usize..500) {
        let security = SecurityConfig { max_repeat: cap, ..Default::default() };
        let count = security.repeat_count(Some(&n.to_string()));
        prop_assert!(count >= 1);
        prop_assert!(count <= cap);
        if n >= 1 && (n as u128) <= cap as u128 {
            prop_assert_eq!(count as u64, n);
        }
    }

    #[test]
    fn repeat_count_of_garbage_is_one(s in "[^0-9]*") {
        prop_assert_eq!(SecurityConfig::default().repeat_count(Some(&s)), 1);
    }

    #[test]
    fn unknown_codes_pass_through(s in "[a-zA-Z]{2,8}") {
        let table = SymbolTable::default();
        prop_assert_eq!(table.transform(&format!("  {}  ", s)), s);
    }

    #[test]
    fn json_round_trip(rows in rows()) {
        let cols = columns(&[true, false, true]);
        let segmenter =
            TableSegmenter::with_parts(Layout::new(0, 1, 4), &cols, RetentionPolicy::default());
        let (table, _) = segmenter.segment("Modules", parsed(rows));
        let mut tables = Tables::new();
        tables.insert("Modules".to_string(), table);

        let mut out = Vec::new();
        write_tables(&tables, &mut out).unwrap();
        let restored: Tables = serde_json::from_slice(&out).unwrap();
        prop_assert_eq!(restored, tables);
    }
}
