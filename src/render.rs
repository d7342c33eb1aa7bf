//! Render Module
//!
//! 表をHTMLテンプレートに流し込むモジュール。
//!
//! テンプレートは`minijinja`で評価されます。組み込みの`index.html`を既定とし、
//! テンプレートディレクトリが設定されている場合はその`index.html`で置き換えます。

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Local, NaiveDate};
use minijinja::Environment;
use serde::Serialize;

use crate::config::MatrixConfig;
use crate::error::MatrixError;
use crate::types::Tables;

const TEMPLATE_NAME: &str = "index.html";
const DEFAULT_TEMPLATE: &str = include_str!("../templates/index.html");

/// 実装ごとの列グループ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColGroup {
    pub implementation: String,
    pub span: usize,
}

/// 表示対象の実装バージョン
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PythonColumn {
    pub implementation: String,
    pub version: String,
    pub released: NaiveDate,
    pub release_notes: Option<String>,
}

/// テンプレートに渡すコンテキスト
#[derive(Debug, Serialize)]
pub struct PageContext<'a> {
    pub sections: &'a [String],
    pub colgroups: Vec<ColGroup>,
    pub pythons: Vec<PythonColumn>,
    pub nlabelcols: usize,
    pub tables: &'a Tables,
    pub mapping: BTreeMap<String, String>,
    pub key: Vec<(String, String)>,
    pub generated: NaiveDate,
}

/// HTMLレンダラー
pub struct Renderer<'a> {
    config: &'a MatrixConfig,
    env: Environment<'static>,
    generated: NaiveDate,
}

impl<'a> Renderer<'a> {
    /// テンプレートを読み込み、`transform`関数を登録する
    pub fn new(config: &'a MatrixConfig) -> Result<Self, MatrixError> {
        let mut env = Environment::new();
        match &config.locations.template_dir {
            Some(dir) => {
                let path = dir.join(TEMPLATE_NAME);
                log::info!("Loading template {}", path.display());
                let source = std::fs::read_to_string(&path)?;
                env.add_template_owned(TEMPLATE_NAME.to_string(), source)?;
            }
            None => env.add_template(TEMPLATE_NAME, DEFAULT_TEMPLATE)?,
        }

        let symbols = config.symbols.clone();
        env.add_function("transform", move |s: &str| -> String { symbols.transform(s) });

        Ok(Self {
            config,
            env,
            generated: Local::now().date_naive(),
        })
    }

    /// 生成日を固定する
    pub fn with_generated(mut self, date: NaiveDate) -> Self {
        self.generated = date;
        self
    }

    /// テンプレートのコンテキストを構築する
    pub fn context<'t>(&self, tables: &'t Tables) -> Result<PageContext<'t>, MatrixError>
    where
        'a: 't,
    {
        let config = self.config;
        let pythons = config
            .included_columns()
            .map(|c| {
                Ok(PythonColumn {
                    implementation: c.implementation.clone(),
                    version: c.version.clone(),
                    released: c.released()?,
                    release_notes: c.release_notes.clone(),
                })
            })
            .collect::<Result<Vec<_>, MatrixError>>()?;

        Ok(PageContext {
            sections: &config.sheet_names,
            colgroups: colgroups(&pythons),
            pythons,
            nlabelcols: config.layout.start_col,
            tables,
            mapping: config.symbols.mapping(),
            key: config.symbols.legend(),
            generated: self.generated,
        })
    }

    /// HTML文字列を生成する
    pub fn render(&self, tables: &Tables) -> Result<String, MatrixError> {
        let context = self.context(tables)?;
        let template = self.env.get_template(TEMPLATE_NAME)?;
        Ok(template.render(&context)?)
    }

    /// HTMLファイルを書き出す
    pub fn render_to_file<P: AsRef<Path>>(&self, tables: &Tables, path: P) -> Result<(), MatrixError> {
        let path = path.as_ref();
        let html = self.render(tables)?;
        std::fs::write(path, html)?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }
}

/// 隣接する同一実装の列をまとめる
fn colgroups(pythons: &[PythonColumn]) -> Vec<ColGroup> {
    let mut groups: Vec<ColGroup> = Vec::new();
    for python in pythons {
        match groups.last_mut() {
            Some(group) if group.implementation == python.implementation => group.span += 1,
            _ => groups.push(ColGroup {
                implementation: python.implementation.clone(),
                span: 1,
            }),
        }
    }
    groups
}
