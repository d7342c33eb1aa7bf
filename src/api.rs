//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

/// 表データの再取得元
///
/// 指定しない場合は、前回保存したJSONを再利用します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[non_exhaustive]
pub enum RefreshSource {
    /// ローカルの旧形式バイナリワークブック（.xls）
    Xls,

    /// ローカルのOpenDocumentスプレッドシート（.ods）
    Ods,

    /// スプレッドシートサービス上のドキュメント
    Gdocs,
}

/// ハイパーリンク付きセルの表示テキストの取得元
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLabel {
    /// 数式 `HYPERLINK("url", "label")` のラベル部分（前後の空白を除去）
    ///
    /// スプレッドシートサービスのセルフィードで使用します。
    Formula,

    /// セルに表示されているテキスト
    ///
    /// ローカルファイル（ODS、XLS）で使用します。
    Displayed,
}

/// サブセクション見出し行の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRows {
    /// 見出し行は名前として使い、データ行には含めない（デフォルト）
    Skip,

    /// 見出し行もデータ行として出力する
    AsData,
}

/// ラベルも値もすべて空の行の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlankRows {
    /// 出力しない（デフォルト）
    Drop,

    /// そのまま出力する
    Keep,
}

/// 行の保持ポリシー
///
/// 入力形式に依存せず、すべてのソースアダプターに同じポリシーを適用します。
///
/// # 使用例
///
/// ```rust,no_run
/// use pycompat_matrix::{BlankRows, HeaderRows, MatrixBuilder, RetentionPolicy};
///
/// # fn main() -> Result<(), pycompat_matrix::MatrixError> {
/// let matrix = MatrixBuilder::new()
///     .with_retention(RetentionPolicy {
///         header_rows: HeaderRows::AsData,
///         blank_rows: BlankRows::Keep,
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// 見出し行の扱い
    pub header_rows: HeaderRows,

    /// 空行の扱い
    pub blank_rows: BlankRows,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            header_rows: HeaderRows::Skip,
            blank_rows: BlankRows::Drop,
        }
    }
}
