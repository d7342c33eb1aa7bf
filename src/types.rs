//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。
//!
//! 中間JSONの形式に合わせて、`Entry`と`Subsection`は配列（タプル）として
//! シリアライズされます。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 整形済みのセル
///
/// `href`はセルがハイパーリンク数式を持つ場合のみ設定されます。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// 表示テキスト（複数行の場合あり）
    pub text: String,

    /// リンク先URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Cell {
    /// テキストのみのセルを生成
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: None,
        }
    }

    /// リンク付きのセルを生成
    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: Some(href.into()),
        }
    }

    /// 空セル
    pub fn empty() -> Self {
        Self::default()
    }

    /// テキストが空かどうか
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

/// セル整形時に検出された異常
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellIssue {
    /// `HYPERLINK(`で始まるが解析できない数式
    MalformedHyperlink(String),

    /// セル内容を読み取れなかった（不正なエスケープなど）
    UnreadableContent(String),
}

impl std::fmt::Display for CellIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellIssue::MalformedHyperlink(formula) => {
                write!(f, "malformed hyperlink formula: {}", formula)
            }
            CellIssue::UnreadableContent(reason) => write!(f, "unreadable content: {}", reason),
        }
    }
}

/// セル整形の結果
///
/// 異常があったセルもフォールバック値を持つため処理は継続できますが、
/// 呼び出し側は`Degraded`を数えて報告できます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellParse {
    /// 正常に整形されたセル
    Value(Cell),

    /// フォールバック値に置き換えられたセル
    Degraded { cell: Cell, issue: CellIssue },
}

impl CellParse {
    /// 整形済みセルを取り出す（異常時はフォールバック値）
    pub fn into_cell(self) -> Cell {
        match self {
            CellParse::Value(cell) => cell,
            CellParse::Degraded { cell, .. } => cell,
        }
    }

    /// セルへの参照を取得
    pub fn cell(&self) -> &Cell {
        match self {
            CellParse::Value(cell) => cell,
            CellParse::Degraded { cell, .. } => cell,
        }
    }

    /// 異常の内容を取得
    pub fn issue(&self) -> Option<&CellIssue> {
        match self {
            CellParse::Value(_) => None,
            CellParse::Degraded { issue, .. } => Some(issue),
        }
    }
}

/// サブセクション内の1行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EntryRepr", into = "EntryRepr")]
pub struct Entry {
    /// 所属するサブセクション名
    pub subsection: String,

    /// ラベル列のセル
    pub labels: Vec<Cell>,

    /// 値列のセル（表示対象の実装バージョンのみ）
    pub values: Vec<Cell>,
}

type EntryRepr = (String, Vec<Cell>, Vec<Cell>);

impl From<EntryRepr> for Entry {
    fn from((subsection, labels, values): EntryRepr) -> Self {
        Self {
            subsection,
            labels,
            values,
        }
    }
}

impl From<Entry> for EntryRepr {
    fn from(entry: Entry) -> Self {
        (entry.subsection, entry.labels, entry.values)
    }
}

impl Entry {
    /// すべてのセルが空かどうか
    pub fn is_blank(&self) -> bool {
        self.labels.iter().all(Cell::is_blank) && self.values.iter().all(Cell::is_blank)
    }
}

/// 見出しを共有する連続した行のまとまり
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SubsectionRepr", into = "SubsectionRepr")]
pub struct Subsection {
    /// サブセクション名
    pub name: String,

    /// 行
    pub entries: Vec<Entry>,
}

type SubsectionRepr = (String, Vec<Entry>);

impl From<SubsectionRepr> for Subsection {
    fn from((name, entries): SubsectionRepr) -> Self {
        Self { name, entries }
    }
}

impl From<Subsection> for SubsectionRepr {
    fn from(subsection: Subsection) -> Self {
        (subsection.name, subsection.entries)
    }
}

/// 1シート分の表
pub type Table = Vec<Subsection>;

/// シート名から表へのマッピング
pub type Tables = BTreeMap<String, Table>;

/// 1シート分の抽出結果の集計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetReport {
    /// シート名
    pub sheet: String,

    /// `start_row`以降で走査した行数
    pub rows_seen: usize,

    /// 出力した行数
    pub entries: usize,

    /// 見出し行・区切り行・空行として捨てた行数
    pub rows_dropped: usize,

    /// 異常のあったセル（行インデックス, 列インデックス, 内容）
    pub degraded: Vec<(usize, usize, CellIssue)>,
}
