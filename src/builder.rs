//! Builder Module
//!
//! Fluent Builder APIを提供し、`Matrix`インスタンスを段階的に構築する。

use std::collections::HashSet;
use std::path::PathBuf;

use crate::api::{RefreshSource, RetentionPolicy};
use crate::config::{
    default_columns, default_sheet_names, ColumnDescriptor, Credentials, HostedConfig, Layout,
    Locations, MatrixConfig,
};
use crate::error::MatrixError;
use crate::persist;
use crate::render::Renderer;
use crate::security::SecurityConfig;
use crate::source::{read_tables, HostedSource, OdsSource, WorkbookSource};
use crate::symbols::SymbolTable;
use crate::types::{SheetReport, Tables};

/// 既定の先頭行（0始まり）
const DEFAULT_START_ROW: usize = 3;

/// Fluent Builder APIを提供する構造体
///
/// `Matrix`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use pycompat_matrix::MatrixBuilder;
///
/// # fn main() -> Result<(), pycompat_matrix::MatrixError> {
/// let matrix = MatrixBuilder::new()
///     .with_ods_path("matrix.ods")
///     .with_output_path("public/index.html")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MatrixBuilder {
    columns: Vec<ColumnDescriptor>,
    sheet_names: Vec<String>,
    start_row: usize,

    /// 明示的なレイアウト（Noneの場合は列記述子から求める）
    layout: Option<Layout>,

    retention: RetentionPolicy,
    symbols: SymbolTable,
    security: SecurityConfig,
    locations: Locations,
    hosted: HostedConfig,
}

impl Default for MatrixBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 列記述子: `d`〜`w`の20列（表示はCPython 2.2〜3.2）
    /// - シート: Builtins, Keywords, Modules, Command line, Platforms, Features
    /// - 先頭行: 3（0始まり）
    /// - 保持ポリシー: 見出し行・空行を出力しない
    pub fn new() -> Self {
        Self {
            columns: default_columns(),
            sheet_names: default_sheet_names(),
            start_row: DEFAULT_START_ROW,
            layout: None,
            retention: RetentionPolicy::default(),
            symbols: SymbolTable::default(),
            security: SecurityConfig::default(),
            locations: Locations::default(),
            hosted: HostedConfig::default(),
        }
    }

    /// 列記述子を置き換える
    ///
    /// レイアウトを明示しない場合、ラベル列数と値列の範囲は
    /// 先頭・末尾の列記述子の文字から求めます。
    ///
    /// ```rust,no_run
    /// use pycompat_matrix::{ColumnDescriptor, MatrixBuilder};
    ///
    /// # fn main() -> Result<(), pycompat_matrix::MatrixError> {
    /// let matrix = MatrixBuilder::new()
    ///     .with_columns(vec![
    ///         ColumnDescriptor::new('c', "CPython", "2.7", "2010-07-04", true),
    ///         ColumnDescriptor::new('d', "PyPy", "1.6", "2011-08-23", true),
    ///     ])
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_columns(mut self, columns: Vec<ColumnDescriptor>) -> Self {
        self.columns = columns;
        self
    }

    /// 読み込むシートの許可リストを置き換える
    pub fn with_sheet_names(mut self, names: Vec<String>) -> Self {
        self.sheet_names = names;
        self
    }

    /// 先頭行（0始まり）を指定する
    pub fn with_start_row(mut self, start_row: usize) -> Self {
        self.start_row = start_row;
        self
    }

    /// レイアウトを明示する
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// 行の保持ポリシーを指定する
    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = symbols;
        self
    }

    /// セキュリティ制限を指定する
    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.security = security;
        self
    }

    pub fn with_ods_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.locations.ods_path = path.into();
        self
    }

    pub fn with_xls_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.locations.xls_path = path.into();
        self
    }

    pub fn with_json_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.locations.json_path = path.into();
        self
    }

    pub fn with_output_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.locations.output_path = path.into();
        self
    }

    /// `index.html`を含むテンプレートディレクトリを指定する
    pub fn with_template_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.locations.template_dir = Some(dir.into());
        self
    }

    pub fn with_spreadsheet_id(mut self, id: impl Into<String>) -> Self {
        self.hosted.spreadsheet_id = id.into();
        self
    }

    /// APIのベースURLを指定する
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.hosted.base_url = url.into();
        self
    }

    /// 認証情報を指定する
    ///
    /// 指定した場合は表示値に加えて数式も取得し、ハイパーリンクを復元します。
    ///
    /// ```rust,no_run
    /// use pycompat_matrix::{Credentials, MatrixBuilder};
    ///
    /// # fn main() -> Result<(), pycompat_matrix::MatrixError> {
    /// let matrix = MatrixBuilder::new()
    ///     .with_credentials(Credentials {
    ///         email: "someone@example.org".to_string(),
    ///         access_token: "ya29.token".to_string(),
    ///         source: "pycompat-matrix".to_string(),
    ///     })
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.hosted.credentials = Some(credentials);
        self
    }

    /// 公開アクセス用のAPIキーを指定する
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.hosted.api_key = Some(key.into());
        self
    }

    /// 1リクエストあたりの行数を指定する
    pub fn with_page_rows(mut self, rows: usize) -> Self {
        self.hosted.page_rows = rows;
        self
    }

    /// リクエストのタイムアウト（秒）を指定する
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.hosted.timeout_secs = secs;
        self
    }

    /// 設定を検証し、Matrixインスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Matrix)`: 設定が有効な場合
    /// * `Err(MatrixError::Config)`: 設定が無効な場合
    ///
    /// # 発生し得るエラー
    ///
    /// * `MatrixError::Config(String)`
    ///   * 列記述子が空、または列の文字が`a`〜`z`以外
    ///   * 列記述子の文字が値列の先頭から連続していない
    ///   * リリース日が`%Y-%m-%d`で解析できない
    ///   * ラベル列がない、または値列の開始 >= 終了
    ///   * 表示対象の列記述子が値列の範囲外
    ///   * シートの許可リストが空、または重複
    pub fn build(self) -> Result<Matrix, MatrixError> {
        // 1. 列記述子の検証
        if self.columns.is_empty() {
            return Err(MatrixError::Config(
                "At least one column descriptor is required".to_string(),
            ));
        }
        for column in &self.columns {
            if column.column_index().is_none() {
                return Err(MatrixError::Config(format!(
                    "Invalid column letter '{}' for {} {}",
                    column.letter, column.implementation, column.version
                )));
            }
            column.released()?;
        }

        // 2. レイアウトの決定と検証
        let layout = match self.layout {
            Some(layout) => layout,
            None => Layout::from_columns(&self.columns, self.start_row).ok_or_else(|| {
                MatrixError::Config("Cannot derive layout from columns".to_string())
            })?,
        };
        if layout.start_col == 0 {
            return Err(MatrixError::Config(
                "At least one label column is required (start_col >= 1)".to_string(),
            ));
        }
        if layout.start_col >= layout.end_col {
            return Err(MatrixError::Config(format!(
                "Invalid layout: start col ({}) >= end col ({})",
                layout.start_col, layout.end_col
            )));
        }

        // 3. 列記述子と値列の対応
        for (offset, column) in self.columns.iter().enumerate() {
            let expected = layout.start_col + offset;
            if column.column_index() != Some(expected) {
                return Err(MatrixError::Config(format!(
                    "Column '{}' ({} {}) does not match value column {}",
                    column.letter, column.implementation, column.version, expected
                )));
            }
            if column.include && expected >= layout.end_col {
                return Err(MatrixError::Config(format!(
                    "Included column '{}' ({} {}) is outside the value columns",
                    column.letter, column.implementation, column.version
                )));
            }
        }

        // 4. シート許可リストの検証
        if self.sheet_names.is_empty() {
            return Err(MatrixError::Config(
                "At least one sheet name is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for name in &self.sheet_names {
            if !seen.insert(name.as_str()) {
                return Err(MatrixError::Config(format!(
                    "Duplicate sheet name '{}'",
                    name
                )));
            }
        }

        // 5. その他の制限
        if self.hosted.page_rows == 0 {
            return Err(MatrixError::Config("page_rows must be >= 1".to_string()));
        }
        if self.security.max_repeat == 0 {
            return Err(MatrixError::Config("max_repeat must be >= 1".to_string()));
        }

        Ok(Matrix {
            config: MatrixConfig {
                columns: self.columns,
                sheet_names: self.sheet_names,
                layout,
                retention: self.retention,
                symbols: self.symbols,
                security: self.security,
                locations: self.locations,
                hosted: self.hosted,
            },
        })
    }
}

/// 処理全体のファサード
///
/// スプレッドシートから表を読み込み、中間JSONに保存し、HTMLを生成します。
///
/// # 使用例
///
/// ```rust,no_run
/// use pycompat_matrix::{MatrixBuilder, RefreshSource};
///
/// # fn main() -> Result<(), pycompat_matrix::MatrixError> {
/// let matrix = MatrixBuilder::new().build()?;
///
/// // ODSから再取得してJSONとHTMLを更新
/// matrix.run(Some(RefreshSource::Ods))?;
///
/// // 保存済みのJSONからHTMLだけを再生成
/// matrix.run(None)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Matrix {
    config: MatrixConfig,
}

impl Matrix {
    /// 検証済みの設定
    pub fn config(&self) -> &MatrixConfig {
        &self.config
    }

    pub fn into_config(self) -> MatrixConfig {
        self.config
    }

    /// 指定した入力から表を読み込む（ファイルには書き出さない）
    pub fn read(&self, source: RefreshSource) -> Result<(Tables, Vec<SheetReport>), MatrixError> {
        let config = &self.config;
        match source {
            RefreshSource::Xls => {
                let mut source = WorkbookSource::open(&config.locations.xls_path, &config.security)?;
                read_tables(&mut source, config)
            }
            RefreshSource::Ods => {
                let mut source =
                    OdsSource::open(&config.locations.ods_path, config.security.clone())?;
                read_tables(&mut source, config)
            }
            RefreshSource::Gdocs => {
                let mut source = HostedSource::connect(&config.hosted, config.layout.end_col)?;
                read_tables(&mut source, config)
            }
        }
    }

    /// 表を再取得し、中間JSONに保存する
    pub fn refresh(&self, source: RefreshSource) -> Result<Tables, MatrixError> {
        log::info!("Refreshing tables from {:?}", source);
        let (tables, reports) = self.read(source)?;
        let degraded: usize = reports.iter().map(|r| r.degraded.len()).sum();
        if degraded > 0 {
            log::warn!("{} cells could not be fully parsed", degraded);
        }
        persist::write_json(&tables, &self.config.locations.json_path)?;
        Ok(tables)
    }

    /// 保存済みの中間JSONを読み込む
    pub fn load_tables(&self) -> Result<Tables, MatrixError> {
        persist::read_json(&self.config.locations.json_path)
    }

    /// HTMLを生成し、出力ファイルに書き出す
    pub fn render(&self, tables: &Tables) -> Result<(), MatrixError> {
        Renderer::new(&self.config)?.render_to_file(tables, &self.config.locations.output_path)
    }

    /// 再取得（指定時）またはJSONの読み込みを行い、HTMLを生成する
    pub fn run(&self, refresh: Option<RefreshSource>) -> Result<Tables, MatrixError> {
        let tables = match refresh {
            Some(source) => self.refresh(source)?,
            None => self.load_tables()?,
        };
        self.render(&tables)?;
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BlankRows, HeaderRows};

    #[test]
    fn test_builder_defaults() {
        let config = MatrixBuilder::new().build().unwrap().into_config();
        assert_eq!(config.layout, Layout::new(3, 3, 23));
        assert_eq!(config.columns.len(), 20);
        assert_eq!(config.included_count(), 9);
        assert_eq!(config.sheet_names.len(), 6);
        assert_eq!(config.retention, RetentionPolicy::default());
        assert_eq!(config.hosted.page_rows, 500);
    }

    #[test]
    fn test_builder_overrides() {
        let config = MatrixBuilder::new()
            .with_start_row(1)
            .with_retention(RetentionPolicy {
                header_rows: HeaderRows::AsData,
                blank_rows: BlankRows::Keep,
            })
            .with_json_path("out/matrix.json")
            .with_spreadsheet_id("abc")
            .with_api_key("key")
            .build()
            .unwrap()
            .into_config();
        assert_eq!(config.layout.start_row, 1);
        assert_eq!(config.retention.header_rows, HeaderRows::AsData);
        assert_eq!(config.locations.json_path, PathBuf::from("out/matrix.json"));
        assert_eq!(config.hosted.spreadsheet_id, "abc");
        assert_eq!(config.hosted.api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_layout_derived_from_columns() {
        let config = MatrixBuilder::new()
            .with_columns(vec![
                ColumnDescriptor::new('c', "CPython", "2.7", "2010-07-04", true),
                ColumnDescriptor::new('d', "PyPy", "1.6", "2011-08-23", true),
            ])
            .build()
            .unwrap()
            .into_config();
        assert_eq!(config.layout, Layout::new(3, 2, 4));
    }

    #[test]
    fn test_empty_columns_rejected() {
        let result = MatrixBuilder::new().with_columns(Vec::new()).build();
        assert!(matches!(result, Err(MatrixError::Config(_))));
    }

    #[test]
    fn test_invalid_letter_rejected() {
        let result = MatrixBuilder::new()
            .with_columns(vec![ColumnDescriptor::new('1', "CPython", "2.7", "2010-07-04", true)])
            .build();
        assert!(matches!(result, Err(MatrixError::Config(_))));
    }

    #[test]
    fn test_invalid_date_rejected() {
        let result = MatrixBuilder::new()
            .with_columns(vec![ColumnDescriptor::new('d', "CPython", "2.7", "2010/07/04", true)])
            .build();
        assert!(matches!(result, Err(MatrixError::Config(_))));
    }

    #[test]
    fn test_no_label_columns_rejected() {
        let result = MatrixBuilder::new()
            .with_columns(vec![ColumnDescriptor::new('a', "CPython", "2.7", "2010-07-04", true)])
            .build();
        assert!(matches!(result, Err(MatrixError::Config(_))));
    }

    #[test]
    fn test_inverted_layout_rejected() {
        let result = MatrixBuilder::new().with_layout(Layout::new(3, 10, 10)).build();
        assert!(matches!(result, Err(MatrixError::Config(_))));
    }

    #[test]
    fn test_non_contiguous_columns_rejected() {
        let result = MatrixBuilder::new()
            .with_columns(vec![
                ColumnDescriptor::new('d', "CPython", "2.6", "2008-10-02", true),
                ColumnDescriptor::new('f', "CPython", "2.7", "2010-07-04", true),
            ])
            .build();
        assert!(matches!(result, Err(MatrixError::Config(_))));
    }

    #[test]
    fn test_included_column_outside_window_rejected() {
        let result = MatrixBuilder::new()
            .with_layout(Layout::new(3, 3, 5))
            .build();
        assert!(matches!(result, Err(MatrixError::Config(_))));
    }

    #[test]
    fn test_excluded_columns_may_exceed_window() {
        let config = MatrixBuilder::new()
            .with_layout(Layout::new(3, 3, 16))
            .build()
            .unwrap()
            .into_config();
        assert_eq!(config.layout.end_col, 16);
    }

    #[test]
    fn test_sheet_names_validated() {
        assert!(matches!(
            MatrixBuilder::new().with_sheet_names(Vec::new()).build(),
            Err(MatrixError::Config(_))
        ));
        assert!(matches!(
            MatrixBuilder::new()
                .with_sheet_names(vec!["Builtins".to_string(), "Builtins".to_string()])
                .build(),
            Err(MatrixError::Config(_))
        ));
    }

    #[test]
    fn test_zero_page_rows_rejected() {
        let result = MatrixBuilder::new().with_page_rows(0).build();
        assert!(matches!(result, Err(MatrixError::Config(_))));
    }

    #[test]
    fn test_load_tables_missing_json() {
        let dir = tempfile::tempdir().unwrap();
        let matrix = MatrixBuilder::new()
            .with_json_path(dir.path().join("index.json"))
            .build()
            .unwrap();
        assert!(matches!(matrix.load_tables(), Err(MatrixError::Io(_))));
    }
}
