//! Hosted Spreadsheet Source Module
//!
//! スプレッドシートサービス（Sheets API v4）からセルを取得する行ソース。
//!
//! HTTPアクセスは`CellFeed`トレイトの背後に隠されており、
//! 行ウィンドウ単位のページングと行へのグループ化は`HostedSource`が行います。

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use super::{select_allowed, RowSource};
use crate::api::LinkLabel;
use crate::config::HostedConfig;
use crate::error::MatrixError;
use crate::formatter::CellFormatter;
use crate::types::{Cell, CellParse};

/// セル取得の範囲（行・列とも1始まり、両端を含む）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub sheet: String,
    pub min_row: usize,
    pub max_row: usize,
    pub max_col: usize,
}

/// サービスから取得したセル（行・列とも1始まり）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedCell {
    pub row: usize,
    pub col: usize,

    /// 入力値（数式の場合は`=`で始まる数式）
    pub input_value: Option<String>,

    /// 表示テキスト
    pub text: String,
}

/// セルフィード
///
/// 範囲内の空セルも含めて返すことが期待されます（末尾の空行は省略可）。
pub trait CellFeed {
    /// ワークシート名の一覧
    fn sheet_titles(&self) -> Result<Vec<String>, MatrixError>;

    /// シートの行数（不明な場合は`None`）
    ///
    /// `None`の場合、`HostedSource`は空のページを受け取るまでページングを続けます。
    fn row_count(&self, _sheet: &str) -> Result<Option<usize>, MatrixError> {
        Ok(None)
    }

    /// 範囲内のセルを取得する
    fn fetch(&self, query: &FeedQuery) -> Result<Vec<FeedCell>, MatrixError>;
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    title: String,
    #[serde(default)]
    grid_properties: Option<GridProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridProperties {
    #[serde(default)]
    row_count: Option<usize>,
}

/// Sheets API v4に対するHTTPセルフィード
///
/// 認証情報がある場合はBearerトークンで表示値と数式の両方を取得し、
/// ない場合は公開アクセス（APIキー任意）で表示値のみを取得します。
pub struct HttpCellFeed {
    client: reqwest::blocking::Client,
    config: HostedConfig,
}

impl HttpCellFeed {
    pub fn new(config: &HostedConfig) -> Result<Self, MatrixError> {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs));
        if let Some(credentials) = &config.credentials {
            log::info!("Authenticating as {}", credentials.email);
            builder = builder.user_agent(credentials.source.clone());
        }
        Ok(Self {
            client: builder.build()?,
            config: config.clone(),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<reqwest::Url, MatrixError> {
        let mut url = reqwest::Url::parse(&self.config.base_url)
            .map_err(|e| MatrixError::Config(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| MatrixError::Config("Base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .push(&self.config.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    fn get<T: for<'de> Deserialize<'de>>(
        &self,
        url: reqwest::Url,
        params: &[(&str, &str)],
    ) -> Result<T, MatrixError> {
        let mut request = self.client.get(url.clone()).query(params);
        match (&self.config.credentials, &self.config.api_key) {
            (Some(credentials), _) => request = request.bearer_auth(&credentials.access_token),
            (None, Some(key)) => request = request.query(&[("key", key.as_str())]),
            (None, None) => {}
        }

        log::debug!("GET {}", url);
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(MatrixError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json()?)
    }

    fn values(&self, range: &str, render: &str) -> Result<Vec<Vec<Value>>, MatrixError> {
        let url = self.url(&["values", range])?;
        let body: ValueRange = self.get(
            url,
            &[("valueRenderOption", render), ("majorDimension", "ROWS")],
        )?;
        Ok(body.values)
    }
}

impl CellFeed for HttpCellFeed {
    fn sheet_titles(&self) -> Result<Vec<String>, MatrixError> {
        let url = self.url(&[])?;
        let body: Spreadsheet = self.get(url, &[("fields", "sheets.properties.title")])?;
        Ok(body
            .sheets
            .into_iter()
            .map(|s| s.properties.title)
            .collect())
    }

    fn row_count(&self, sheet: &str) -> Result<Option<usize>, MatrixError> {
        let url = self.url(&[])?;
        let body: Spreadsheet = self.get(
            url,
            &[("fields", "sheets.properties(title,gridProperties.rowCount)")],
        )?;
        Ok(body
            .sheets
            .into_iter()
            .find(|s| s.properties.title == sheet)
            .and_then(|s| s.properties.grid_properties)
            .and_then(|g| g.row_count))
    }

    fn fetch(&self, query: &FeedQuery) -> Result<Vec<FeedCell>, MatrixError> {
        let range = a1_range(query);
        let displayed = self.values(&range, "FORMATTED_VALUE")?;
        let formulas = if self.config.credentials.is_some() {
            self.values(&range, "FORMULA")?
        } else {
            Vec::new()
        };

        let mut cells = Vec::new();
        for (i, row) in displayed.iter().enumerate() {
            for col in 0..query.max_col {
                let input_value = formulas
                    .get(i)
                    .and_then(|r| r.get(col))
                    .map(value_text)
                    .filter(|v| v.starts_with('='));
                cells.push(FeedCell {
                    row: query.min_row + i,
                    col: col + 1,
                    input_value,
                    text: row.get(col).map(value_text).unwrap_or_default(),
                });
            }
        }
        Ok(cells)
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// 1始まりの列番号を列文字に変換する（1 → `A`、27 → `AA`）
pub(crate) fn column_letters(mut col: usize) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        col = (col - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A1形式の範囲（例: `'Command line'!A1:W500`）
pub(crate) fn a1_range(query: &FeedQuery) -> String {
    format!(
        "'{}'!A{}:{}{}",
        query.sheet.replace('\'', "''"),
        query.min_row,
        column_letters(query.max_col),
        query.max_row
    )
}

/// スプレッドシートサービスの行ソース
pub struct HostedSource<F: CellFeed> {
    feed: F,
    page_rows: usize,
    max_col: usize,
    formatter: CellFormatter,
}

impl HostedSource<HttpCellFeed> {
    /// HTTPフィードで接続する
    pub fn connect(config: &HostedConfig, end_col: usize) -> Result<Self, MatrixError> {
        log::info!("Connecting to spreadsheet {}", config.spreadsheet_id);
        Ok(Self::new(HttpCellFeed::new(config)?, config.page_rows, end_col))
    }
}

impl<F: CellFeed> HostedSource<F> {
    /// # 引数
    ///
    /// * `feed` - セルフィード
    /// * `page_rows` - 1回の取得で要求する行数
    /// * `max_col` - 取得する列数
    pub fn new(feed: F, page_rows: usize, max_col: usize) -> Self {
        Self {
            feed,
            page_rows: page_rows.max(1),
            max_col,
            formatter: CellFormatter::new(LinkLabel::Formula),
        }
    }
}

impl<F: CellFeed> RowSource for HostedSource<F> {
    type Sheet = String;
    type Row = Vec<FeedCell>;
    type Cell = FeedCell;

    fn enumerate_sheets(&mut self, allowed: &[String]) -> Result<Vec<String>, MatrixError> {
        select_allowed(self.feed.sheet_titles()?, allowed, |s| s.as_str())
    }

    fn sheet_name(&self, sheet: &String) -> String {
        sheet.clone()
    }

    fn enumerate_rows(&mut self, sheet: String) -> Result<Vec<(usize, Vec<FeedCell>)>, MatrixError> {
        let mut grouped: BTreeMap<usize, Vec<FeedCell>> = BTreeMap::new();
        let mut min_row = 1;
        let row_count = self.feed.row_count(&sheet)?;

        loop {
            let query = FeedQuery {
                sheet: sheet.clone(),
                min_row,
                max_row: min_row + self.page_rows - 1,
                max_col: self.max_col,
            };
            let cells = self.feed.fetch(&query)?;
            let page_empty = cells.is_empty();
            log::debug!(
                "Fetched {} cells from '{}' rows {}..={}",
                cells.len(),
                sheet,
                query.min_row,
                query.max_row
            );

            for cell in cells {
                if cell.row >= 1 && cell.col >= 1 {
                    grouped.entry(cell.row).or_default().push(cell);
                }
            }

            // 末尾の空行はフィードが省略するため、ページ内の最終行では終端を判定しない
            let done = match row_count {
                Some(count) => query.max_row >= count,
                None => page_empty,
            };
            if done {
                break;
            }
            min_row = query.max_row + 1;
        }

        // 省略された空行は区切り行として空の行で補う
        let last_row = grouped.keys().next_back().copied().unwrap_or(0);
        Ok((1..=last_row)
            .map(|row| {
                let cells = grouped.remove(&row).unwrap_or_default();
                (row - 1, dense_row(row, cells))
            })
            .collect())
    }

    fn enumerate_cells(&self, row: Vec<FeedCell>) -> Vec<FeedCell> {
        row
    }

    fn format_cell(&self, cell: Option<&FeedCell>) -> CellParse {
        match cell {
            Some(cell) => self
                .formatter
                .format(&cell.text, cell.input_value.as_deref()),
            None => CellParse::Value(Cell::empty()),
        }
    }
}

/// 列番号順に並べ、欠けている列を空セルで埋める
fn dense_row(row: usize, mut cells: Vec<FeedCell>) -> Vec<FeedCell> {
    cells.sort_by_key(|c| c.col);
    let width = cells.last().map(|c| c.col).unwrap_or(0);
    let mut dense: Vec<FeedCell> = (1..=width)
        .map(|col| FeedCell {
            row,
            col,
            ..Default::default()
        })
        .collect();
    for cell in cells {
        let idx = cell.col - 1;
        dense[idx] = cell;
    }
    dense
}
