//! Workbook Source Module
//!
//! calamineを使用したXLS/XLSXワークブックの行ソース。

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};

use super::{select_allowed, RowSource};
use crate::api::LinkLabel;
use crate::error::MatrixError;
use crate::formatter::CellFormatter;
use crate::security::SecurityConfig;
use crate::types::{Cell, CellParse};

/// ワークブックのセル
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookCell {
    /// セルの値（数式の場合はキャッシュされた結果）
    pub value: Data,

    /// セルの数式
    pub formula: Option<String>,
}

impl WorkbookCell {
    /// 表示テキスト
    pub fn text(&self) -> String {
        match &self.value {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// ワークブック行ソース
pub struct WorkbookSource<RS: Read + Seek> {
    workbook: Sheets<RS>,
    formatter: CellFormatter,
}

impl WorkbookSource<BufReader<File>> {
    /// ワークブックファイルを開く（形式は拡張子から判定）
    pub fn open<P: AsRef<Path>>(path: P, security: &SecurityConfig) -> Result<Self, MatrixError> {
        let path = path.as_ref();
        log::info!("Opening workbook {}", path.display());
        security.check_input_size(std::fs::metadata(path)?.len())?;
        let workbook = open_workbook_auto(path)?;
        Ok(Self::with_workbook(workbook))
    }
}

impl<RS: Read + Seek + Clone> WorkbookSource<RS> {
    /// 任意のリーダーからワークブックを読み込む（形式は内容から判定）
    pub fn from_reader(reader: RS) -> Result<Self, MatrixError> {
        let workbook = open_workbook_auto_from_rs(reader)?;
        Ok(Self::with_workbook(workbook))
    }
}

impl<RS: Read + Seek> WorkbookSource<RS> {
    fn with_workbook(workbook: Sheets<RS>) -> Self {
        Self {
            workbook,
            formatter: CellFormatter::new(LinkLabel::Displayed),
        }
    }
}

impl<RS: Read + Seek> RowSource for WorkbookSource<RS> {
    type Sheet = String;
    type Row = Vec<WorkbookCell>;
    type Cell = WorkbookCell;

    fn enumerate_sheets(&mut self, allowed: &[String]) -> Result<Vec<String>, MatrixError> {
        select_allowed(self.workbook.sheet_names(), allowed, |s| s.as_str())
    }

    fn sheet_name(&self, sheet: &String) -> String {
        sheet.clone()
    }

    fn enumerate_rows(
        &mut self,
        sheet: String,
    ) -> Result<Vec<(usize, Vec<WorkbookCell>)>, MatrixError> {
        let range = self.workbook.worksheet_range(&sheet)?;
        // 数式は全セルで再利用するため一度だけ取得する
        let formulas = self.workbook.worksheet_formula(&sheet).ok();

        // calamineの範囲は使用領域から始まるため、行・列はA1起点の絶対座標で数える
        let Some((end_row, end_col)) = range.end() else {
            return Ok(Vec::new());
        };

        let rows = (0..=end_row)
            .map(|row| {
                let cells = (0..=end_col)
                    .map(|col| WorkbookCell {
                        value: range.get_value((row, col)).cloned().unwrap_or(Data::Empty),
                        formula: formula_at(formulas.as_ref(), row, col),
                    })
                    .collect();
                (row as usize, cells)
            })
            .collect();

        Ok(rows)
    }

    fn enumerate_cells(&self, row: Vec<WorkbookCell>) -> Vec<WorkbookCell> {
        row
    }

    fn format_cell(&self, cell: Option<&WorkbookCell>) -> CellParse {
        match cell {
            Some(cell) => self.formatter.format(&cell.text(), cell.formula.as_deref()),
            None => CellParse::Value(Cell::empty()),
        }
    }
}

fn formula_at(formulas: Option<&Range<String>>, row: u32, col: u32) -> Option<String> {
    formulas
        .and_then(|range| range.get_value((row, col)))
        .filter(|f| !f.is_empty())
        .cloned()
}
