//! Formatter Module
//!
//! セルの表示テキストとハイパーリンクを抽出するモジュール。
//! ODSの`of:=HYPERLINK("url"; "label")`と、XLS・スプレッドシートサービスの
//! `=HYPERLINK("url", "label")`の両方を認識します。

use regex::Regex;

use crate::api::LinkLabel;
use crate::types::{Cell, CellIssue, CellParse};

/// セルフォーマッター
///
/// 各ソースアダプターが1つずつ保持し、セルごとに`format`を呼び出します。
#[derive(Debug)]
pub struct CellFormatter {
    /// ハイパーリンク数式（URLとラベルを捕捉）
    hyperlink: Regex,

    /// ハイパーリンク数式らしき先頭部分
    hyperlink_prefix: Regex,

    /// 表示テキストの取得元
    label: LinkLabel,
}

impl CellFormatter {
    /// 新しいCellFormatterインスタンスを生成
    pub fn new(label: LinkLabel) -> Self {
        Self {
            hyperlink: Regex::new(
                r#"(?i)^\s*(?:of:)?=?\s*hyperlink\(\s*"([^"]+)"\s*[;,]\s*"([^"]+)"\s*\)"#,
            )
            .expect("Hardcode regex pattern"),
            hyperlink_prefix: Regex::new(r"(?i)^\s*(?:of:)?=?\s*hyperlink\s*\(")
                .expect("Hardcode regex pattern"),
            label,
        }
    }

    /// セルを整形する
    ///
    /// # 引数
    ///
    /// * `text` - セルの表示テキスト（段落は`\n`で結合済み）
    /// * `formula` - セルの数式（存在する場合）
    ///
    /// # 戻り値
    ///
    /// ハイパーリンク数式が認識できた場合は`href`付きのセル、
    /// 数式が壊れている場合は`CellParse::Degraded`
    pub fn format(&self, text: &str, formula: Option<&str>) -> CellParse {
        let formula = match formula {
            Some(f) if !f.trim().is_empty() => f,
            _ => return CellParse::Value(Cell::text(text)),
        };

        if let Some(caps) = self.hyperlink.captures(formula) {
            let url = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let label = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            let display = match self.label {
                LinkLabel::Formula => label.trim(),
                LinkLabel::Displayed => text,
            };
            return CellParse::Value(Cell::link(display, url));
        }

        if self.hyperlink_prefix.is_match(formula) {
            return CellParse::Degraded {
                cell: Cell::text(text),
                issue: CellIssue::MalformedHyperlink(formula.to_string()),
            };
        }

        // HYPERLINK以外の数式は表示テキストのみ
        CellParse::Value(Cell::text(text))
    }

    /// 内容を読み取れなかったセル
    pub fn unreadable(&self, reason: impl Into<String>) -> CellParse {
        CellParse::Degraded {
            cell: Cell::empty(),
            issue: CellIssue::UnreadableContent(reason.into()),
        }
    }
}

/// 段落を改行で結合する
pub(crate) fn join_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> String {
    paragraphs
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join("\n")
}
