//! pycompat-matrix - Python implementation feature matrix generator
//!
//! This crate reads a hand-maintained spreadsheet that records which features
//! (builtins, keywords, modules, command-line options, ...) each Python
//! implementation and version supports, persists the extracted tables as JSON,
//! and renders them into a static HTML page.
//!
//! The spreadsheet can be read from an OpenDocument file (`.ods`), a binary or
//! OOXML workbook (`.xls` / `.xlsx`), or a hosted spreadsheet service.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pycompat_matrix::{MatrixBuilder, RefreshSource};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Default columns, sheets and file locations
//!     let matrix = MatrixBuilder::new()
//!         .with_ods_path("Python comparison matrix.ods")
//!         .build()?;
//!
//!     // Read the ODS file, write index.json and index.html
//!     matrix.run(Some(RefreshSource::Ods))?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Reading Tables Without Writing Files
//!
//! ```rust,no_run
//! use pycompat_matrix::{read_tables, MatrixBuilder, OdsSource};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let matrix = MatrixBuilder::new().build()?;
//!     let config = matrix.config();
//!
//!     let mut source = OdsSource::open("matrix.ods", config.security.clone())?;
//!     let (tables, reports) = read_tables(&mut source, config)?;
//!
//!     for report in &reports {
//!         println!("{}: {} entries", report.sheet, report.entries);
//!     }
//!     println!("{} sheets", tables.len());
//!
//!     Ok(())
//! }
//! ```

mod api;
mod builder;
mod config;
mod error;
mod formatter;
mod persist;
mod render;
mod security;
mod segmenter;
mod source;
mod symbols;
mod types;

// 公開API
pub use api::{BlankRows, HeaderRows, LinkLabel, RefreshSource, RetentionPolicy};
pub use builder::{Matrix, MatrixBuilder};
pub use config::{
    default_columns, default_sheet_names, ColumnDescriptor, Credentials, HostedConfig, Layout,
    Locations, MatrixConfig,
};
pub use error::MatrixError;
pub use formatter::CellFormatter;
pub use persist::{read_json, write_json, write_tables};
pub use render::{ColGroup, PageContext, PythonColumn, Renderer};
pub use security::{SecurityConfig, DEFAULT_MAX_REPEAT};
pub use segmenter::{group_adjacent, TableSegmenter};
pub use source::{
    read_tables, CellFeed, FeedCell, FeedQuery, HostedSource, HttpCellFeed, OdsCell, OdsRow,
    OdsSheet, OdsSource, RowSource, WorkbookCell, WorkbookSource,
};
pub use symbols::{Symbol, SymbolTable};
pub use types::{Cell, CellIssue, CellParse, Entry, SheetReport, Subsection, Table, Tables};
