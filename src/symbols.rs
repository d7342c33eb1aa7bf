//! Symbol Mapping Module
//!
//! スプレッドシート上の短いコード（`d`, `f`, `*` など）を、
//! HTMLに表示する記号と凡例の説明文に対応付けるモジュール。

use std::collections::BTreeMap;

use serde::Serialize;

/// 記号表の1項目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    /// セルに書かれるコード
    pub code: String,

    /// 表示する記号
    pub glyph: String,

    /// 凡例の説明文
    pub description: String,
}

impl Symbol {
    fn new(code: &str, glyph: &str, description: &str) -> Self {
        Self {
            code: code.to_string(),
            glyph: glyph.to_string(),
            description: description.to_string(),
        }
    }
}

/// コードから記号への固定テーブル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new(vec![
            Symbol::new("", "", "Not supported"),
            Symbol::new("/", "\u{2B1B}", "Supported"),
            Symbol::new("f", "\u{25A3}", "Supported, with __future__ import"),
            Symbol::new("e", "\u{2B1B}", "Supported, enhanced"),
            Symbol::new("*", "\u{2B24}", "Supported, changed semantics"),
            Symbol::new("d", "\u{25E7}", "Deprecated"),
            Symbol::new("u", "", "Unsupported in this version"),
            Symbol::new("?", "\u{FFFD}", "Unknown support"),
            Symbol::new("D", "D", "Default packaged version"),
            Symbol::new("O", "O", "Optional packaged version"),
        ])
    }
}

impl SymbolTable {
    /// 任意の記号表を生成
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self { symbols }
    }

    /// 前後の空白を除去し、対応する記号を返す
    ///
    /// 未知のコードは空白除去後の文字列をそのまま返します。
    ///
    /// ```rust
    /// use pycompat_matrix::SymbolTable;
    ///
    /// let table = SymbolTable::default();
    /// assert_eq!(table.transform(" d "), "\u{25E7}");
    /// assert_eq!(table.transform("zzz"), "zzz");
    /// ```
    pub fn transform(&self, s: &str) -> String {
        let s = s.trim();
        self.symbols
            .iter()
            .find(|symbol| symbol.code == s)
            .map(|symbol| symbol.glyph.clone())
            .unwrap_or_else(|| s.to_string())
    }

    /// コード → 記号のマッピング
    pub fn mapping(&self) -> BTreeMap<String, String> {
        self.symbols
            .iter()
            .map(|symbol| (symbol.code.clone(), symbol.glyph.clone()))
            .collect()
    }

    /// 凡例（記号, 説明文）をテーブル順に返す
    pub fn legend(&self) -> Vec<(String, String)> {
        self.symbols
            .iter()
            .map(|symbol| (symbol.glyph.clone(), symbol.description.clone()))
            .collect()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}
