//! Table Segmenter Module
//!
//! 1シート分の行を、空ラベル行で区切られた名前付きサブセクションに分割するモジュール。
//!
//! シートは人が読むための表として作られており、各ブロックの先頭行が見出し、
//! ラベル列がすべて空の行がブロックの終わりを表します。

use crate::api::{BlankRows, HeaderRows, RetentionPolicy};
use crate::config::{ColumnDescriptor, Layout, MatrixConfig};
use crate::types::{Cell, CellParse, Entry, SheetReport, Subsection, Table};

/// テーブルセグメンター
#[derive(Debug, Clone)]
pub struct TableSegmenter<'a> {
    layout: Layout,
    columns: &'a [ColumnDescriptor],
    retention: RetentionPolicy,
}

impl<'a> TableSegmenter<'a> {
    /// 設定からセグメンターを生成
    pub fn new(config: &'a MatrixConfig) -> Self {
        Self::with_parts(config.layout, &config.columns, config.retention)
    }

    pub fn with_parts(
        layout: Layout,
        columns: &'a [ColumnDescriptor],
        retention: RetentionPolicy,
    ) -> Self {
        Self {
            layout,
            columns,
            retention,
        }
    }

    /// 行をサブセクションに分割する
    ///
    /// # 引数
    ///
    /// * `sheet` - シート名（レポート用）
    /// * `rows` - (0始まりの行インデックス, 整形済みセル) の列
    ///
    /// # 戻り値
    ///
    /// サブセクションの列と、抽出結果の集計
    pub fn segment<I>(&self, sheet: &str, rows: I) -> (Table, SheetReport)
    where
        I: IntoIterator<Item = (usize, Vec<CellParse>)>,
    {
        let mut report = SheetReport {
            sheet: sheet.to_string(),
            ..Default::default()
        };
        let mut table: Table = Vec::new();
        let mut awaiting_header = true;
        let mut subsection_name = String::new();

        for (row_idx, row) in rows {
            if row_idx < self.layout.start_row {
                continue;
            }
            report.rows_seen += 1;

            for (col_idx, parse) in row.iter().enumerate().take(self.layout.end_col) {
                if let Some(issue) = parse.issue() {
                    log::warn!(
                        "{}: row {}, column {}: {}",
                        sheet,
                        row_idx + 1,
                        col_idx + 1,
                        issue
                    );
                    report.degraded.push((row_idx, col_idx, issue.clone()));
                }
            }
            let cells: Vec<Cell> = row.into_iter().map(CellParse::into_cell).collect();

            if awaiting_header {
                awaiting_header = false;
                subsection_name = cells.first().map(|c| c.text.clone()).unwrap_or_default();
                log::debug!(
                    "{}: subsection '{}' starts at row {}",
                    sheet,
                    subsection_name,
                    row_idx + 1
                );
                // 見出しのみでデータ行のないサブセクションも残す
                if !subsection_name.is_empty() {
                    open_subsection(&mut table, &subsection_name);
                }
                if self.retention.header_rows == HeaderRows::Skip {
                    report.rows_dropped += 1;
                    continue;
                }
            } else if self.labels_blank(&cells) {
                awaiting_header = true;
                report.rows_dropped += 1;
                continue;
            }

            let entry = Entry {
                subsection: subsection_name.clone(),
                labels: self.labels(&cells),
                values: self.values(&cells),
            };

            if self.retention.blank_rows == BlankRows::Drop && entry.is_blank() {
                report.rows_dropped += 1;
                continue;
            }
            open_subsection(&mut table, &entry.subsection);
            if let Some(last) = table.last_mut() {
                last.entries.push(entry);
            }
            report.entries += 1;
        }

        (table, report)
    }

    /// ラベル列がすべて空かどうか
    fn labels_blank(&self, cells: &[Cell]) -> bool {
        cells
            .iter()
            .take(self.layout.start_col)
            .all(Cell::is_blank)
    }

    /// ラベル列（不足分は空セルで補う）
    fn labels(&self, cells: &[Cell]) -> Vec<Cell> {
        (0..self.layout.start_col)
            .map(|col| cells.get(col).cloned().unwrap_or_default())
            .collect()
    }

    /// 値列
    ///
    /// 値列と列記述子を先頭から対応付け、短い方で打ち切ります。
    /// 表示対象の列記述子に対応するセルのみ残します。
    fn values(&self, cells: &[Cell]) -> Vec<Cell> {
        let width = self.layout.end_col.saturating_sub(self.layout.start_col);
        self.columns
            .iter()
            .take(width)
            .enumerate()
            .filter(|(_, column)| column.include)
            .map(|(offset, _)| {
                cells
                    .get(self.layout.start_col + offset)
                    .cloned()
                    .unwrap_or_default()
            })
            .collect()
    }
}

/// 直前のサブセクションと名前が異なる場合のみ、新しいサブセクションを追加する
fn open_subsection(table: &mut Table, name: &str) {
    if table.last().map_or(true, |last| last.name != name) {
        table.push(Subsection {
            name: name.to_string(),
            entries: Vec::new(),
        });
    }
}

/// 隣接する同名の行をまとめる
///
/// 離れた位置にある同名のサブセクションは統合しません。
pub fn group_adjacent(entries: Vec<Entry>) -> Table {
    let mut table: Table = Vec::new();
    for entry in entries {
        open_subsection(&mut table, &entry.subsection);
        if let Some(last) = table.last_mut() {
            last.entries.push(entry);
        }
    }
    table
}
