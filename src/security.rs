//! Security Module
//!
//! 入力ファイルに対する制限を実装するモジュール。
//! ZIP bomb攻撃、パストラバーサル攻撃、圧縮された繰り返し行・列の
//! 過剰な展開への対策を提供します。

use std::io::{Read, Seek};

use zip::ZipArchive;

use crate::error::MatrixError;

/// 繰り返し属性の展開上限（既定値）
pub const DEFAULT_MAX_REPEAT: usize = 100;

/// セキュリティ設定
///
/// ファイル処理時のセキュリティ制限を定義します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    /// 展開後の最大サイズ（バイト）
    /// デフォルト: 1GB (1_073_741_824 bytes)
    pub max_decompressed_size: u64,
    /// ZIPアーカイブ内の最大ファイル数
    /// デフォルト: 10000
    pub max_file_count: usize,
    /// 単一ファイルの最大サイズ（バイト）
    /// デフォルト: 100MB (104_857_600 bytes)
    pub max_file_size: u64,
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 2GB (2_147_483_648 bytes)
    pub max_input_file_size: u64,
    /// 行・列の繰り返し属性を展開する最大数
    /// デフォルト: 100
    pub max_repeat: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_decompressed_size: 1_073_741_824, // 1GB
            max_file_count: 10_000,
            max_file_size: 104_857_600,         // 100MB
            max_input_file_size: 2_147_483_648, // 2GB
            max_repeat: DEFAULT_MAX_REPEAT,
        }
    }
}

impl SecurityConfig {
    /// ZIPアーカイブ全体を検証する
    ///
    /// ファイル数、各エントリのパスとサイズ、展開後の合計サイズを確認します。
    pub fn check_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
    ) -> Result<(), MatrixError> {
        if archive.len() > self.max_file_count {
            return Err(MatrixError::SecurityViolation(format!(
                "ZIP archive contains too many files: {} (max: {})",
                archive.len(),
                self.max_file_count
            )));
        }

        let mut total_decompressed_size = 0u64;
        for i in 0..archive.len() {
            let file = archive
                .by_index(i)
                .map_err(|e| MatrixError::Zip(format!("{}", e)))?;

            let file_name = file.name();
            validate_zip_path(file_name).map_err(|e| {
                MatrixError::SecurityViolation(format!("Invalid ZIP path: {}", e))
            })?;

            let file_size = file.size();
            if file_size > self.max_file_size {
                return Err(MatrixError::SecurityViolation(format!(
                    "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                    file_name, file_size, self.max_file_size
                )));
            }

            total_decompressed_size = total_decompressed_size
                .checked_add(file_size)
                .ok_or_else(|| {
                    MatrixError::SecurityViolation(
                        "Total decompressed size calculation overflow".to_string(),
                    )
                })?;

            if total_decompressed_size > self.max_decompressed_size {
                return Err(MatrixError::SecurityViolation(format!(
                    "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                    total_decompressed_size, self.max_decompressed_size
                )));
            }
        }

        Ok(())
    }

    /// 入力ファイルのサイズを検証する
    pub fn check_input_size(&self, bytes: u64) -> Result<(), MatrixError> {
        if bytes > self.max_input_file_size {
            return Err(MatrixError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                bytes, self.max_input_file_size
            )));
        }
        Ok(())
    }

    /// 繰り返し属性の値を展開数に変換する
    ///
    /// 属性がない、または数値として解釈できない場合は1、
    /// 上限を超える場合は上限値を返します。
    pub fn repeat_count(&self, raw: Option<&str>) -> usize {
        let count = raw
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(1);
        count.min(self.max_repeat)
    }
}

/// ファイルパスの検証
///
/// パストラバーサル攻撃を防ぐため、ファイルパスを検証します。
///
/// # 戻り値
///
/// * `Ok(())` - パスが安全な場合
/// * `Err(String)` - パスが危険な場合（`..`や絶対パスを含む）
pub(crate) fn validate_zip_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    if path.starts_with('/') || path.starts_with("C:\\") || path.starts_with("c:\\") {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    if path.contains("..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_zip_path_valid() {
        assert!(validate_zip_path("content.xml").is_ok());
        assert!(validate_zip_path("META-INF/manifest.xml").is_ok());
        assert!(validate_zip_path("Thumbnails/thumbnail.png").is_ok());
    }

    #[test]
    fn test_validate_zip_path_rejected() {
        assert!(validate_zip_path("").is_err());
        assert!(validate_zip_path("/etc/passwd").is_err());
        assert!(validate_zip_path("c:\\content.xml").is_err());
        assert!(validate_zip_path("../content.xml").is_err());
        assert!(validate_zip_path("META-INF\\manifest.xml").is_err());
    }

    #[test]
    fn test_repeat_count() {
        let config = SecurityConfig::default();
        assert_eq!(config.repeat_count(Some("5")), 5);
        assert_eq!(config.repeat_count(None), 1);
        assert_eq!(config.repeat_count(Some("")), 1);
        assert_eq!(config.repeat_count(Some("abc")), 1);
        assert_eq!(config.repeat_count(Some("0")), 1);
        assert_eq!(config.repeat_count(Some("1048576")), DEFAULT_MAX_REPEAT);
        assert_eq!(config.repeat_count(Some("100")), 100);
    }

    #[test]
    fn test_repeat_count_custom_cap() {
        let config = SecurityConfig {
            max_repeat: 3,
            ..Default::default()
        };
        assert_eq!(config.repeat_count(Some("5")), 3);
    }

    #[test]
    fn test_check_input_size() {
        let config = SecurityConfig {
            max_input_file_size: 10,
            ..Default::default()
        };
        assert!(config.check_input_size(10).is_ok());
        assert!(matches!(
            config.check_input_size(11),
            Err(MatrixError::SecurityViolation(_))
        ));
    }
}
