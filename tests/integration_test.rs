//! Integration Tests for pycompat-matrix
//!
//! 生成したワークブック・ODSファイルから、JSONとHTMLまでの処理全体を検証します。

use std::io::{Cursor, Write};
use std::path::Path;

use pycompat_matrix::{
    read_tables, CellIssue, MatrixBuilder, MatrixError, OdsSource, RefreshSource, SecurityConfig,
};
use rust_xlsxwriter::{Formula, Workbook, XlsxError};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

// Helper module for generating test fixtures
mod fixtures {
    use super::*;

    /// Keywordsシート: Operators（2行）、空ラベル行、Statements（1行）
    pub fn keywords_workbook(path: &Path) -> Result<(), XlsxError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Keywords")?;

        sheet.write_string(0, 0, "Python comparison matrix")?;
        sheet.write_string(2, 3, "CPython")?;

        sheet.write_string(3, 0, "Operators")?;
        sheet.write_string(4, 0, "and")?;
        sheet.write_string(4, 7, "/")?;
        sheet.write_string(4, 15, "d")?;
        sheet.write_string(5, 0, "or")?;
        sheet.write_string(5, 8, "f")?;
        // 行6はラベル列が空（区切り）
        sheet.write_string(6, 10, "stray")?;
        sheet.write_string(7, 0, "Statements")?;
        sheet.write_formula(
            8,
            0,
            Formula::new(
                r#"=HYPERLINK("http://docs.python.org/reference/compound_stmts.html#with","with")"#,
            )
            .set_result("with"),
        )?;
        sheet.write_string(8, 12, "/")?;
        // 表示対象外の列（w）
        sheet.write_string(8, 22, "/")?;

        let other = workbook.add_worksheet();
        other.set_name("Scratch")?;
        other.write_string(5, 0, "ignored")?;

        workbook.save(path)
    }

    /// ODSのZIPアーカイブを生成する
    pub fn ods_bytes(tables: &str) -> Vec<u8> {
        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0"><office:body><office:spreadsheet>{}</office:spreadsheet></office:body></office:document-content>"#,
            tables
        );
        let mut zip_data = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut zip_data));
            let options = FileOptions::default().compression_method(CompressionMethod::Stored);
            zip.start_file("mimetype", options).unwrap();
            zip.write_all(b"application/vnd.oasis.opendocument.spreadsheet")
                .unwrap();
            zip.start_file("content.xml", options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        zip_data
    }

    fn text_cell(text: &str) -> String {
        format!(
            r#"<table:table-cell office:value-type="string"><text:p>{}</text:p></table:table-cell>"#,
            text
        )
    }

    fn empty_cells(n: usize) -> String {
        format!(r#"<table:table-cell table:number-columns-repeated="{}"/>"#, n)
    }

    /// Keywordsシートと同じ内容のODS（繰り返し属性で圧縮）
    pub fn keywords_ods() -> Vec<u8> {
        let rows = [
            format!(
                r#"<table:table-row table:number-rows-repeated="3">{}</table:table-row>"#,
                empty_cells(1024)
            ),
            format!("<table:table-row>{}</table:table-row>", text_cell("Operators")),
            format!(
                "<table:table-row>{}{}{}{}{}</table:table-row>",
                text_cell("and"),
                empty_cells(6),
                text_cell("/"),
                empty_cells(7),
                text_cell("d")
            ),
            format!(
                "<table:table-row>{}{}{}</table:table-row>",
                text_cell("or"),
                empty_cells(7),
                text_cell("f")
            ),
            format!(
                "<table:table-row>{}{}</table:table-row>",
                empty_cells(10),
                text_cell("stray")
            ),
            format!("<table:table-row>{}</table:table-row>", text_cell("Statements")),
            format!(
                r#"<table:table-row><table:table-cell table:formula="of:=HYPERLINK(&quot;http://docs.python.org/reference/compound_stmts.html#with&quot;; &quot;with&quot;)" office:value-type="string"><text:p>with</text:p></table:table-cell>{}{}</table:table-row>"#,
                empty_cells(11),
                text_cell("/")
            ),
            format!(
                r#"<table:table-row table:number-rows-repeated="1048566">{}</table:table-row>"#,
                empty_cells(1024)
            ),
        ];
        ods_bytes(&format!(
            r#"<table:table table:name="Keywords">{}</table:table><table:table table:name="Scratch"></table:table>"#,
            rows.concat()
        ))
    }
}

fn assert_keywords(tables: &pycompat_matrix::Tables) {
    let keywords = &tables["Keywords"];
    assert_eq!(keywords.len(), 2);

    assert_eq!(keywords[0].name, "Operators");
    assert_eq!(keywords[0].entries.len(), 2);
    let and = &keywords[0].entries[0];
    assert_eq!(and.labels.len(), 3);
    assert_eq!(and.labels[0].text, "and");
    assert_eq!(and.values.len(), 9);
    assert_eq!(and.values[0].text, "/");
    assert_eq!(and.values[8].text, "d");
    assert_eq!(keywords[0].entries[1].values[1].text, "f");

    assert_eq!(keywords[1].name, "Statements");
    assert_eq!(keywords[1].entries.len(), 1);
    let with = &keywords[1].entries[0];
    assert_eq!(
        with.labels[0].href.as_deref(),
        Some("http://docs.python.org/reference/compound_stmts.html#with")
    );
    assert_eq!(with.values[5].text, "/");
}

#[test]
fn test_workbook_refresh_and_render() {
    let dir = tempfile::tempdir().unwrap();
    let xlsx = dir.path().join("matrix.xlsx");
    fixtures::keywords_workbook(&xlsx).unwrap();

    let matrix = MatrixBuilder::new()
        .with_sheet_names(vec!["Keywords".to_string()])
        .with_xls_path(&xlsx)
        .with_json_path(dir.path().join("index.json"))
        .with_output_path(dir.path().join("index.html"))
        .build()
        .unwrap();

    let tables = matrix.run(Some(RefreshSource::Xls)).unwrap();
    assert_eq!(tables.len(), 1);
    assert_keywords(&tables);

    assert!(dir.path().join("index.json").exists());
    let html = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
    assert!(html.contains("Operators"));
    assert!(html.contains("\u{25E7}"));
    assert!(html.contains("\u{25A3}"));
}

#[test]
fn test_ods_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let ods = dir.path().join("matrix.ods");
    std::fs::write(&ods, fixtures::keywords_ods()).unwrap();

    let matrix = MatrixBuilder::new()
        .with_sheet_names(vec!["Keywords".to_string()])
        .with_ods_path(&ods)
        .with_json_path(dir.path().join("index.json"))
        .with_output_path(dir.path().join("index.html"))
        .build()
        .unwrap();

    let (tables, reports) = matrix.read(RefreshSource::Ods).unwrap();
    assert_keywords(&tables);

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].sheet, "Keywords");
    assert_eq!(reports[0].entries, 3);
    assert!(reports[0].degraded.is_empty());
    // 末尾の空行は上限まで展開され、すべて捨てられる
    assert!(reports[0].rows_dropped >= 100);
}

#[test]
fn test_json_reused_without_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let ods = dir.path().join("matrix.ods");
    std::fs::write(&ods, fixtures::keywords_ods()).unwrap();

    let matrix = MatrixBuilder::new()
        .with_sheet_names(vec!["Keywords".to_string()])
        .with_ods_path(&ods)
        .with_json_path(dir.path().join("index.json"))
        .with_output_path(dir.path().join("index.html"))
        .build()
        .unwrap();

    let refreshed = matrix.run(Some(RefreshSource::Ods)).unwrap();
    std::fs::remove_file(&ods).unwrap();
    std::fs::remove_file(dir.path().join("index.html")).unwrap();

    let reused = matrix.run(None).unwrap();
    assert_eq!(refreshed, reused);
    assert!(dir.path().join("index.html").exists());
}

#[test]
fn test_ods_and_workbook_agree() {
    let dir = tempfile::tempdir().unwrap();
    let xlsx = dir.path().join("matrix.xlsx");
    fixtures::keywords_workbook(&xlsx).unwrap();
    let ods = dir.path().join("matrix.ods");
    std::fs::write(&ods, fixtures::keywords_ods()).unwrap();

    let matrix = MatrixBuilder::new()
        .with_sheet_names(vec!["Keywords".to_string()])
        .with_xls_path(&xlsx)
        .with_ods_path(&ods)
        .build()
        .unwrap();

    let (from_ods, _) = matrix.read(RefreshSource::Ods).unwrap();
    let (from_xlsx, _) = matrix.read(RefreshSource::Xls).unwrap();
    let values = |tables: &pycompat_matrix::Tables| -> Vec<Vec<String>> {
        tables["Keywords"]
            .iter()
            .flat_map(|s| s.entries.iter())
            .map(|e| e.values.iter().map(|c| c.text.clone()).collect())
            .collect()
    };
    assert_eq!(values(&from_ods), values(&from_xlsx));
}

#[test]
fn test_missing_sheet_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let ods = dir.path().join("matrix.ods");
    std::fs::write(&ods, fixtures::keywords_ods()).unwrap();

    let matrix = MatrixBuilder::new()
        .with_sheet_names(vec!["Keywords".to_string(), "Modules".to_string()])
        .with_ods_path(&ods)
        .build()
        .unwrap();

    match matrix.read(RefreshSource::Ods) {
        Err(MatrixError::SheetNotFound(name)) => assert_eq!(name, "Modules"),
        other => panic!("Expected SheetNotFound, got {:?}", other.map(|(t, _)| t)),
    }
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let matrix = MatrixBuilder::new()
        .with_ods_path(dir.path().join("missing.ods"))
        .build()
        .unwrap();
    assert!(matches!(
        matrix.read(RefreshSource::Ods),
        Err(MatrixError::Io(_))
    ));
}

#[test]
fn test_malformed_hyperlink_is_degraded() {
    let data = fixtures::ods_bytes(
        r#"<table:table table:name="Keywords"><table:table-row table:number-rows-repeated="3"><table:table-cell/></table:table-row><table:table-row><table:table-cell><text:p>Operators</text:p></table:table-cell></table:table-row><table:table-row><table:table-cell table:formula="of:=HYPERLINK(&quot;http://broken"><text:p>and</text:p></table:table-cell></table:table-row></table:table>"#,
    );
    let matrix = MatrixBuilder::new()
        .with_sheet_names(vec!["Keywords".to_string()])
        .build()
        .unwrap();

    let mut source = OdsSource::from_reader(Cursor::new(data), SecurityConfig::default()).unwrap();
    let (tables, reports) = read_tables(&mut source, matrix.config()).unwrap();

    let entry = &tables["Keywords"][0].entries[0];
    assert_eq!(entry.labels[0].text, "and");
    assert_eq!(entry.labels[0].href, None);

    assert_eq!(reports[0].degraded.len(), 1);
    let (row, col, issue) = &reports[0].degraded[0];
    assert_eq!((*row, *col), (4, 0));
    assert!(matches!(issue, CellIssue::MalformedHyperlink(_)));
}
