//! Persistence Module
//!
//! 読み込んだ表を中間JSONファイルとして保存・復元するモジュール。
//! 再読み込みせずにHTMLだけを再生成できるようにします。

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::MatrixError;
use crate::types::Tables;

/// 表をJSONファイルに書き出す（4スペースインデント）
pub fn write_json<P: AsRef<Path>>(tables: &Tables, path: P) -> Result<(), MatrixError> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_tables(tables, &mut writer)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    log::info!("Wrote {} tables to {}", tables.len(), path.display());
    Ok(())
}

/// JSONファイルから表を読み込む
pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Tables, MatrixError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let tables: Tables = serde_json::from_reader(reader)?;
    log::info!("Loaded {} tables from {}", tables.len(), path.display());
    Ok(tables)
}

/// 表を任意のライターへJSONとして書き出す
pub fn write_tables<W: Write>(tables: &Tables, writer: W) -> Result<(), MatrixError> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    tables.serialize(&mut serializer)?;
    Ok(())
}
