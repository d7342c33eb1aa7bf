//! ODS Source Module
//!
//! OpenDocumentスプレッドシート（ZIPアーカイブ内の`content.xml`）を
//! `quick-xml`で直接解析する行ソース。
//!
//! ODSは連続する同一の行・セルを`table:number-rows-repeated`・
//! `table:number-columns-repeated`で圧縮するため、ここで論理行・論理セルに
//! 展開します。展開数は`SecurityConfig::max_repeat`で制限されます。

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use super::{select_allowed, RowSource};
use crate::api::LinkLabel;
use crate::error::MatrixError;
use crate::formatter::{join_paragraphs, CellFormatter};
use crate::security::SecurityConfig;
use crate::types::{Cell, CellParse};

const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";

const TABLE: &[u8] = b"table:table";
const TABLE_ROW: &[u8] = b"table:table-row";
const TABLE_CELL: &[u8] = b"table:table-cell";
const COVERED_TABLE_CELL: &[u8] = b"table:covered-table-cell";
const ANNOTATION: &[u8] = b"office:annotation";
const PARAGRAPH: &[u8] = b"text:p";
const SPACE: &[u8] = b"text:s";
const TAB: &[u8] = b"text:tab";
const LINE_BREAK: &[u8] = b"text:line-break";

/// ODSのセル
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OdsCell {
    /// `text:p`段落のテキスト
    pub paragraphs: Vec<String>,

    /// `table:formula`属性
    pub formula: Option<String>,

    /// テキストを読み取れなかった場合の理由
    pub unreadable: Option<String>,
}

/// ODSの行（繰り返し展開済み）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OdsRow {
    pub cells: Vec<OdsCell>,
}

/// ODSのシート（繰り返し展開済み）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OdsSheet {
    pub name: String,
    pub rows: Vec<OdsRow>,
}

/// ODS行ソース
pub struct OdsSource {
    /// `content.xml`の内容
    content: Vec<u8>,
    security: SecurityConfig,
    formatter: CellFormatter,
}

impl OdsSource {
    /// ODSファイルを開く
    pub fn open<P: AsRef<Path>>(path: P, security: SecurityConfig) -> Result<Self, MatrixError> {
        let path = path.as_ref();
        log::info!("Opening ODS file {}", path.display());
        let file = File::open(path)?;
        security.check_input_size(file.metadata()?.len())?;
        Self::from_reader(BufReader::new(file), security)
    }

    /// 任意のリーダーからODSを読み込む
    pub fn from_reader<R: Read + Seek>(
        reader: R,
        security: SecurityConfig,
    ) -> Result<Self, MatrixError> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| MatrixError::Zip(format!("{}", e)))?;
        security.check_archive(&mut archive)?;
        check_mime(&mut archive)?;

        let mut content = Vec::new();
        archive
            .by_name("content.xml")
            .map_err(|e| MatrixError::Zip(format!("content.xml: {}", e)))?
            .read_to_end(&mut content)?;

        Ok(Self {
            content,
            security,
            formatter: CellFormatter::new(LinkLabel::Displayed),
        })
    }

    /// `content.xml`を解析し、許可リストに含まれるシートを取り出す
    fn parse_sheets(&self, allowed: &[String]) -> Result<Vec<OdsSheet>, MatrixError> {
        let mut reader = Reader::from_reader(self.content.as_slice());
        let mut buf = Vec::new();

        let mut sheets = Vec::new();
        let mut sheet: Option<OdsSheet> = None;
        let mut row = OdsRow::default();
        let mut row_repeat = 1usize;
        let mut cell = OdsCell::default();
        let mut cell_repeat = 1usize;
        let mut in_cell = false;
        let mut in_paragraph = false;
        let mut annotation_depth = 0usize;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    TABLE => {
                        let name = attribute(&e, b"table:name")?.unwrap_or_default();
                        sheet = if allowed.iter().any(|n| n == &name) {
                            Some(OdsSheet {
                                name,
                                rows: Vec::new(),
                            })
                        } else {
                            None
                        };
                    }
                    TABLE_ROW if sheet.is_some() => {
                        row = OdsRow::default();
                        row_repeat = self.repeat(&e, b"table:number-rows-repeated");
                    }
                    TABLE_CELL | COVERED_TABLE_CELL if sheet.is_some() => {
                        cell = new_cell(&e);
                        cell_repeat = self.repeat(&e, b"table:number-columns-repeated");
                        in_cell = true;
                    }
                    ANNOTATION if in_cell => annotation_depth += 1,
                    PARAGRAPH if in_cell && annotation_depth == 0 => {
                        cell.paragraphs.push(String::new());
                        in_paragraph = true;
                    }
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    TABLE_ROW if sheet.is_some() => {
                        let repeat = self.repeat(&e, b"table:number-rows-repeated");
                        push_repeated(sheet.as_mut(), OdsRow::default(), repeat);
                    }
                    TABLE_CELL | COVERED_TABLE_CELL if sheet.is_some() => {
                        let repeat = self.repeat(&e, b"table:number-columns-repeated");
                        row.cells
                            .extend(std::iter::repeat(new_cell(&e)).take(repeat));
                    }
                    PARAGRAPH if in_cell && annotation_depth == 0 => {
                        cell.paragraphs.push(String::new());
                    }
                    SPACE if in_paragraph && annotation_depth == 0 => {
                        let count = attribute(&e, b"text:c")
                            .ok()
                            .flatten()
                            .and_then(|c| c.parse::<usize>().ok())
                            .unwrap_or(1);
                        push_text(&mut cell, &" ".repeat(count));
                    }
                    TAB if in_paragraph && annotation_depth == 0 => push_text(&mut cell, "\t"),
                    LINE_BREAK if in_paragraph && annotation_depth == 0 => {
                        push_text(&mut cell, "\n")
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) if in_paragraph && annotation_depth == 0 => {
                    match e.unescape() {
                        Ok(text) => push_text(&mut cell, &text),
                        Err(err) => cell.unreadable = Some(err.to_string()),
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    TABLE => {
                        if let Some(done) = sheet.take() {
                            log::debug!("Parsed ODS table '{}' ({} rows)", done.name, done.rows.len());
                            sheets.push(done);
                        }
                    }
                    TABLE_ROW if sheet.is_some() => {
                        push_repeated(sheet.as_mut(), std::mem::take(&mut row), row_repeat);
                    }
                    TABLE_CELL | COVERED_TABLE_CELL if in_cell => {
                        row.cells
                            .extend(std::iter::repeat(std::mem::take(&mut cell)).take(cell_repeat));
                        in_cell = false;
                        in_paragraph = false;
                        annotation_depth = 0;
                    }
                    ANNOTATION if annotation_depth > 0 => annotation_depth -= 1,
                    PARAGRAPH if annotation_depth == 0 => in_paragraph = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(MatrixError::Xml(format!(
                        "content.xml at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
            buf.clear();
        }

        select_allowed(sheets, allowed, |s| s.name.as_str())
    }

    fn repeat(&self, e: &BytesStart, key: &[u8]) -> usize {
        let raw = attribute(e, key).ok().flatten();
        self.security.repeat_count(raw.as_deref())
    }
}

impl RowSource for OdsSource {
    type Sheet = OdsSheet;
    type Row = OdsRow;
    type Cell = OdsCell;

    fn enumerate_sheets(&mut self, allowed: &[String]) -> Result<Vec<OdsSheet>, MatrixError> {
        self.parse_sheets(allowed)
    }

    fn sheet_name(&self, sheet: &OdsSheet) -> String {
        sheet.name.clone()
    }

    fn enumerate_rows(&mut self, sheet: OdsSheet) -> Result<Vec<(usize, OdsRow)>, MatrixError> {
        Ok(sheet.rows.into_iter().enumerate().collect())
    }

    fn enumerate_cells(&self, row: OdsRow) -> Vec<OdsCell> {
        row.cells
    }

    fn format_cell(&self, cell: Option<&OdsCell>) -> CellParse {
        let Some(cell) = cell else {
            return CellParse::Value(Cell::empty());
        };
        if let Some(reason) = &cell.unreadable {
            return self.formatter.unreadable(reason.clone());
        }
        self.formatter
            .format(&join_paragraphs(&cell.paragraphs), cell.formula.as_deref())
    }
}

/// `mimetype`エントリがある場合、ODSであることを確認する
fn check_mime<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<(), MatrixError> {
    if let Ok(mut file) = archive.by_name("mimetype") {
        let mut mime = Vec::new();
        file.read_to_end(&mut mime)?;
        if String::from_utf8_lossy(&mime).trim().as_bytes() != MIME_TYPE {
            return Err(MatrixError::Zip(format!(
                "Not an OpenDocument spreadsheet: {}",
                String::from_utf8_lossy(&mime)
            )));
        }
    }
    Ok(())
}

/// 属性値を取得する
fn attribute(e: &BytesStart, key: &[u8]) -> Result<Option<String>, MatrixError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| MatrixError::Xml(err.to_string()))?;
        if attr.key.as_ref() == key {
            let raw = std::str::from_utf8(&attr.value)?;
            let value = quick_xml::escape::unescape(raw)
                .map_err(|err| MatrixError::Xml(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn new_cell(e: &BytesStart) -> OdsCell {
    match attribute(e, b"table:formula") {
        Ok(formula) => OdsCell {
            formula,
            ..Default::default()
        },
        Err(err) => OdsCell {
            unreadable: Some(err.to_string()),
            ..Default::default()
        },
    }
}

fn push_text(cell: &mut OdsCell, text: &str) {
    if let Some(paragraph) = cell.paragraphs.last_mut() {
        paragraph.push_str(text);
    }
}

fn push_repeated(sheet: Option<&mut OdsSheet>, row: OdsRow, repeat: usize) {
    if let Some(sheet) = sheet {
        sheet
            .rows
            .extend(std::iter::repeat(row).take(repeat));
    }
}
