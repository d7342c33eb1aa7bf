//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。
//!
//! セル単位の異常はエラーにせず`CellParse::Degraded`として扱うため、
//! ここに現れるのは実行全体を中断すべき失敗のみです。

use thiserror::Error;

/// pycompat-matrixクレート全体で使用するエラー型
///
/// # エラーの種類
///
/// - `Io`: ファイルの読み書きに失敗した
/// - `Parse`: calamineがワークブックを解析できなかった
/// - `Zip` / `Xml`: ODSコンテナまたは`content.xml`が壊れている
/// - `Json`: 中間JSONの読み書きに失敗した
/// - `Template`: HTMLテンプレートの読み込み・描画に失敗した
/// - `Network` / `Http`: スプレッドシートサービスへのアクセスに失敗した
/// - `SheetNotFound`: 許可リストのシートが入力に存在しない
/// - `Config`: 設定の検証に失敗した
/// - `SecurityViolation`: ZIPアーカイブがセキュリティ制限に違反した
#[derive(Error, Debug)]
pub enum MatrixError {
    /// I/O操作中に発生したエラー
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ワークブックの解析中に発生したエラー（calamine由来）
    #[error("Failed to parse workbook: {0}")]
    Parse(#[from] calamine::Error),

    /// UTF-8文字列の変換エラー
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// ZIPアーカイブの解析エラー
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// XMLの解析エラー
    #[error("XML parse error: {0}")]
    Xml(String),

    /// JSONのシリアライズ・デシリアライズエラー
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// テンプレートエンジンのエラー
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// HTTPクライアントのエラー（接続失敗、タイムアウトなど）
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// サービスが成功以外のステータスを返した
    ///
    /// 401/403は認証の拒否を意味します。
    #[error("HTTP {status} from {url}")]
    Http {
        /// HTTPステータスコード
        status: u16,
        /// リクエストURL（APIキーを除く）
        url: String,
    },

    /// 許可リストに含まれるシートが入力に存在しない
    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    /// 設定の検証に失敗したエラー
    ///
    /// `MatrixBuilder::build()`時に検出されます。
    ///
    /// ```rust,no_run
    /// use pycompat_matrix::{Layout, MatrixBuilder, MatrixError};
    ///
    /// let result = MatrixBuilder::new()
    ///     .with_layout(Layout::new(3, 10, 10))
    ///     .build();
    ///
    /// match result {
    ///     Err(MatrixError::Config(msg)) => println!("設定エラー: {}", msg),
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// セキュリティ制限に違反したエラー
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}
