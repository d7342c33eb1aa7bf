//! Configuration Module
//!
//! 列記述子、シート許可リスト、レイアウトなど、起動時に一度だけ構築して
//! 各コンポーネントへ明示的に渡す設定データを定義するモジュール。

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::api::RetentionPolicy;
use crate::error::MatrixError;
use crate::security::SecurityConfig;
use crate::symbols::SymbolTable;

/// 追跡対象の実装・バージョンとスプレッドシート列の対応
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// 列の文字（`'a'`〜`'z'`）
    pub letter: char,

    /// 実装名（例: `CPython`）
    pub implementation: String,

    /// バージョン文字列（例: `2.7`）
    pub version: String,

    /// リリース日（`%Y-%m-%d`）
    pub release_date: String,

    /// HTMLに出力するかどうか
    pub include: bool,

    /// リリースノート（What's New）のURL
    pub release_notes: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(
        letter: char,
        implementation: &str,
        version: &str,
        release_date: &str,
        include: bool,
    ) -> Self {
        Self {
            letter,
            implementation: implementation.to_string(),
            version: version.to_string(),
            release_date: release_date.to_string(),
            include,
            release_notes: None,
        }
    }

    /// リリースノートのURLを設定する
    pub fn with_release_notes(mut self, url: &str) -> Self {
        self.release_notes = Some(url.to_string());
        self
    }

    /// 0始まりの列インデックス（`'a'` → 0）
    pub fn column_index(&self) -> Option<usize> {
        let letter = self.letter.to_ascii_lowercase();
        if letter.is_ascii_lowercase() {
            Some(letter as usize - 'a' as usize)
        } else {
            None
        }
    }

    /// リリース日を解析する
    pub fn released(&self) -> Result<NaiveDate, MatrixError> {
        NaiveDate::parse_from_str(&self.release_date, "%Y-%m-%d").map_err(|e| {
            MatrixError::Config(format!(
                "Invalid release date '{}' for {} {}: {}",
                self.release_date, self.implementation, self.version, e
            ))
        })
    }
}

/// 既定の列記述子
///
/// 表示するのはCPython 2.2〜3.2のみです。
pub fn default_columns() -> Vec<ColumnDescriptor> {
    const WHATSNEW: &str = "http://docs.python.org/whatsnew";
    const PY3K_WHATSNEW: &str = "http://docs.python.org/py3k/whatsnew";
    vec![
        ColumnDescriptor::new('d', "CPython", "1.5", "1997-12-31", false),
        ColumnDescriptor::new('e', "CPython", "1.6", "2000-09-05", false),
        ColumnDescriptor::new('f', "CPython", "2.0", "2000-10-16", false)
            .with_release_notes(&format!("{WHATSNEW}/2.0.html")),
        ColumnDescriptor::new('g', "CPython", "2.1", "2001-04-15", false)
            .with_release_notes(&format!("{WHATSNEW}/2.1.html")),
        ColumnDescriptor::new('h', "CPython", "2.2", "2001-12-21", true)
            .with_release_notes(&format!("{WHATSNEW}/2.2.html")),
        ColumnDescriptor::new('i', "CPython", "2.3", "2003-07-29", true)
            .with_release_notes(&format!("{WHATSNEW}/2.3.html")),
        ColumnDescriptor::new('j', "CPython", "2.4", "2004-11-30", true)
            .with_release_notes(&format!("{WHATSNEW}/2.4.html")),
        ColumnDescriptor::new('k', "CPython", "2.5", "2006-09-19", true)
            .with_release_notes(&format!("{WHATSNEW}/2.5.html")),
        ColumnDescriptor::new('l', "CPython", "2.6", "2008-10-02", true)
            .with_release_notes(&format!("{WHATSNEW}/2.6.html")),
        ColumnDescriptor::new('m', "CPython", "2.7", "2010-07-04", true)
            .with_release_notes(&format!("{WHATSNEW}/2.7.html")),
        ColumnDescriptor::new('n', "CPython", "3.0", "2008-12-03", true)
            .with_release_notes(&format!("{PY3K_WHATSNEW}/3.0.html")),
        ColumnDescriptor::new('o', "CPython", "3.1", "2009-06-27", true)
            .with_release_notes(&format!("{PY3K_WHATSNEW}/3.1.html")),
        ColumnDescriptor::new('p', "CPython", "3.2", "2011-02-05", true)
            .with_release_notes(&format!("{PY3K_WHATSNEW}/3.2.html")),
        ColumnDescriptor::new('q', "Jython", "2.0", "2001-01-16", false),
        ColumnDescriptor::new('r', "Jython", "2.1", "2001-12-30", false),
        ColumnDescriptor::new('s', "Jython", "2.2", "2007-08-22", false),
        ColumnDescriptor::new('t', "IronPython", "1.0", "2006-09-05", false),
        ColumnDescriptor::new('u', "IronPython", "1.1", "2007-04-17", false),
        ColumnDescriptor::new('v', "IronPython", "2.0", "2008-12-10", false),
        ColumnDescriptor::new('w', "PyPy", "1.6", "2011-08-23", false),
    ]
}

/// 既定のシート許可リスト
pub fn default_sheet_names() -> Vec<String> {
    [
        "Builtins",
        "Keywords",
        "Modules",
        "Command line",
        "Platforms",
        "Features",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// シート上の表の位置
///
/// 行・列ともに0始まりです。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// これより前の行は読み飛ばす
    pub start_row: usize,

    /// これより前の列がラベル列、以降が値列
    pub start_col: usize,

    /// 値列の終端（この列を含まない）
    pub end_col: usize,
}

impl Layout {
    pub fn new(start_row: usize, start_col: usize, end_col: usize) -> Self {
        Self {
            start_row,
            start_col,
            end_col,
        }
    }

    /// 列記述子から列範囲を求める（先頭行は`start_row`）
    pub fn from_columns(columns: &[ColumnDescriptor], start_row: usize) -> Option<Self> {
        let start_col = columns.first()?.column_index()?;
        let end_col = columns.last()?.column_index()? + 1;
        Some(Self::new(start_row, start_col, end_col))
    }
}

/// スプレッドシートサービスの認証情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// アカウントのメールアドレス
    pub email: String,

    /// アクセストークン
    pub access_token: String,

    /// 呼び出し元アプリケーション名（User-Agentとして送信）
    pub source: String,
}

/// スプレッドシートサービスへの接続設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedConfig {
    /// スプレッドシートID
    pub spreadsheet_id: String,

    /// APIのベースURL
    pub base_url: String,

    /// 認証情報（Noneの場合は公開・読み取り専用アクセス）
    pub credentials: Option<Credentials>,

    /// 公開アクセス用のAPIキー
    pub api_key: Option<String>,

    /// 1リクエストあたりの行数
    pub page_rows: usize,

    /// リクエストのタイムアウト（秒）
    pub timeout_secs: u64,
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: "0At5kubLl6ri7dHU2OEJFWkJ1SE16NUNvaGg2UFBxMUE".to_string(),
            base_url: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
            credentials: None,
            api_key: None,
            page_rows: 500,
            timeout_secs: 30,
        }
    }
}

/// 入出力ファイルの場所
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    /// ODSファイル
    pub ods_path: PathBuf,

    /// XLSファイル
    pub xls_path: PathBuf,

    /// 中間JSONファイル
    pub json_path: PathBuf,

    /// 出力HTMLファイル
    pub output_path: PathBuf,

    /// テンプレートディレクトリ（`index.html`を含む）。Noneの場合は組み込みテンプレート
    pub template_dir: Option<PathBuf>,
}

impl Default for Locations {
    fn default() -> Self {
        Self {
            ods_path: PathBuf::from("Python comparison matrix.ods"),
            xls_path: PathBuf::from("Python comparison matrix.xls"),
            json_path: PathBuf::from("index.json"),
            output_path: PathBuf::from("index.html"),
            template_dir: None,
        }
    }
}

/// 検証済みの設定一式
///
/// `MatrixBuilder::build()`でのみ生成され、以後変更されません。
#[derive(Debug, Clone)]
pub struct MatrixConfig {
    /// 列記述子
    pub columns: Vec<ColumnDescriptor>,

    /// シート許可リスト
    pub sheet_names: Vec<String>,

    /// 表の位置
    pub layout: Layout,

    /// 行の保持ポリシー
    pub retention: RetentionPolicy,

    /// 記号表
    pub symbols: SymbolTable,

    /// ZIP・繰り返し属性の制限
    pub security: SecurityConfig,

    /// 入出力ファイルの場所
    pub locations: Locations,

    /// スプレッドシートサービスの設定
    pub hosted: HostedConfig,
}

impl MatrixConfig {
    /// 表示対象の列記述子
    pub fn included_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.include)
    }

    /// 表示対象の列数
    pub fn included_count(&self) -> usize {
        self.included_columns().count()
    }
}
