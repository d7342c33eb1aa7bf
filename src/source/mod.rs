//! Source Adapter Module
//!
//! 入力形式ごとの行・セルモデルを、共通の`RowSource`として扱うモジュール。
//! セグメンターは`RowSource`に対して一度だけ実装されています。

mod hosted;
mod ods;
mod workbook;

pub use hosted::{CellFeed, FeedCell, FeedQuery, HostedSource, HttpCellFeed};
pub use ods::{OdsCell, OdsRow, OdsSheet, OdsSource};
pub use workbook::{WorkbookCell, WorkbookSource};

use crate::config::MatrixConfig;
use crate::error::MatrixError;
use crate::segmenter::TableSegmenter;
use crate::types::{CellParse, SheetReport, Tables};

/// 行ソース
///
/// シート → 行 → セルの順に列挙し、各セルを整形する能力を表します。
pub trait RowSource {
    /// シートのハンドル
    type Sheet;
    /// 行のハンドル
    type Row;
    /// セルのハンドル
    type Cell;

    /// 許可リストに含まれるシートを列挙する
    ///
    /// 許可リストにないシートは無視し、許可リストにあって入力にないシートは
    /// `MatrixError::SheetNotFound`とします。
    fn enumerate_sheets(&mut self, allowed: &[String]) -> Result<Vec<Self::Sheet>, MatrixError>;

    /// シート名
    fn sheet_name(&self, sheet: &Self::Sheet) -> String;

    /// シートの行を (0始まりの行インデックス, 行) として列挙する
    fn enumerate_rows(&mut self, sheet: Self::Sheet)
        -> Result<Vec<(usize, Self::Row)>, MatrixError>;

    /// 行のセルを列順に列挙する
    fn enumerate_cells(&self, row: Self::Row) -> Vec<Self::Cell>;

    /// セルを整形する（`None`は存在しないセル）
    fn format_cell(&self, cell: Option<&Self::Cell>) -> CellParse;
}

/// 任意の行ソースから全シートの表を読み込む
///
/// # 戻り値
///
/// * `Ok((Tables, Vec<SheetReport>))` - シート名 → 表のマッピングと、シートごとの集計
/// * `Err(MatrixError)` - 入力の読み込みに失敗した場合
pub fn read_tables<S: RowSource>(
    source: &mut S,
    config: &MatrixConfig,
) -> Result<(Tables, Vec<SheetReport>), MatrixError> {
    let segmenter = TableSegmenter::new(config);
    let mut tables = Tables::new();
    let mut reports = Vec::new();

    for sheet in source.enumerate_sheets(&config.sheet_names)? {
        let name = source.sheet_name(&sheet);
        let rows = source.enumerate_rows(sheet)?;
        log::info!("Reading sheet '{}' ({} rows)", name, rows.len());

        let formatted: Vec<(usize, Vec<CellParse>)> = rows
            .into_iter()
            .map(|(row_idx, row)| {
                let cells = source.enumerate_cells(row);
                let parsed = cells
                    .iter()
                    .take(config.layout.end_col)
                    .map(|cell| source.format_cell(Some(cell)))
                    .collect();
                (row_idx, parsed)
            })
            .collect();

        let (table, report) = segmenter.segment(&name, formatted);
        log::info!(
            "Sheet '{}': {} subsections, {} entries, {} rows dropped, {} degraded cells",
            name,
            table.len(),
            report.entries,
            report.rows_dropped,
            report.degraded.len()
        );
        tables.insert(name, table);
        reports.push(report);
    }

    Ok((tables, reports))
}

/// 許可リストの順にシートを選び、存在しないシートをエラーにする
pub(crate) fn select_allowed<T, F>(
    available: Vec<T>,
    allowed: &[String],
    name_of: F,
) -> Result<Vec<T>, MatrixError>
where
    F: Fn(&T) -> &str,
{
    if let Some(missing) = allowed
        .iter()
        .find(|name| !available.iter().any(|s| name_of(s) == name.as_str()))
    {
        return Err(MatrixError::SheetNotFound(missing.clone()));
    }

    Ok(available
        .into_iter()
        .filter(|s| allowed.iter().any(|name| name == name_of(s)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_allowed_filters_and_keeps_order() {
        let available = vec!["Builtins", "Scratch", "Keywords"];
        let allowed = vec!["Keywords".to_string(), "Builtins".to_string()];
        let selected = select_allowed(available, &allowed, |s| *s).unwrap();
        assert_eq!(selected, vec!["Builtins", "Keywords"]);
    }

    #[test]
    fn test_select_allowed_missing_sheet() {
        let available = vec!["Builtins"];
        let allowed = vec!["Builtins".to_string(), "Modules".to_string()];
        match select_allowed(available, &allowed, |s| *s) {
            Err(MatrixError::SheetNotFound(name)) => assert_eq!(name, "Modules"),
            other => panic!("Expected SheetNotFound, got {:?}", other),
        }
    }
}
