//! Security Module
//!
//! セキュリティ対策を実装するモジュール。
//! ZIP bomb攻撃、パストラバーサル攻撃などへの対策を提供します。
//! スプレッドシートとテンプレート文書の両方のアーカイブに適用されます。

use std::io::{Read, Seek};
use zip::ZipArchive;

use crate::error::OfferError;

/// セキュリティ設定
///
/// ファイル処理時のセキュリティ制限を定義します。
#[derive(Debug, Clone)]
pub(crate) struct SecurityConfig {
    /// 展開後の最大サイズ（バイト）
    /// デフォルト: 512MB
    pub max_decompressed_size: u64,
    /// ZIPアーカイブ内の最大ファイル数
    /// デフォルト: 10000
    pub max_file_count: usize,
    /// 単一ファイルの最大サイズ（バイト）
    /// デフォルト: 100MB (104_857_600 bytes)
    pub max_file_size: u64,
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 256MB
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_decompressed_size: 536_870_912, // 512MB
            max_file_count: 10_000,
            max_file_size: 104_857_600,       // 100MB
            max_input_file_size: 268_435_456, // 256MB
        }
    }
}

impl SecurityConfig {
    /// 入力バイト列のサイズを検証
    pub fn check_input_size(&self, len: usize) -> Result<(), OfferError> {
        if len as u64 > self.max_input_file_size {
            return Err(OfferError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                len, self.max_input_file_size
            )));
        }
        Ok(())
    }

    /// アーカイブ全体を検証
    ///
    /// ファイル数、各エントリのパスとサイズ、展開後サイズの累計を確認します。
    pub fn check_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
    ) -> Result<(), OfferError> {
        if archive.len() > self.max_file_count {
            return Err(OfferError::SecurityViolation(format!(
                "ZIP archive contains too many files: {} (max: {})",
                archive.len(),
                self.max_file_count
            )));
        }

        let mut total_decompressed_size = 0u64;
        for i in 0..archive.len() {
            let file = archive
                .by_index(i)
                .map_err(|e| OfferError::MalformedContainer(e.to_string()))?;

            // パストラバーサル対策
            let file_name = file.name();
            validate_zip_path(file_name)
                .map_err(|e| OfferError::SecurityViolation(format!("Invalid ZIP path: {}", e)))?;

            let file_size = file.size();
            if file_size > self.max_file_size {
                return Err(OfferError::SecurityViolation(format!(
                    "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                    file_name, file_size, self.max_file_size
                )));
            }

            total_decompressed_size = total_decompressed_size
                .checked_add(file_size)
                .ok_or_else(|| {
                    OfferError::SecurityViolation(
                        "Total decompressed size calculation overflow".to_string(),
                    )
                })?;

            if total_decompressed_size > self.max_decompressed_size {
                return Err(OfferError::SecurityViolation(format!(
                    "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                    total_decompressed_size, self.max_decompressed_size
                )));
            }
        }

        Ok(())
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

    // 絶対パスを拒否（Windows形式の`C:\`やUnix形式の`/`で始まるパス）
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
    use std::io::{Cursor, Write};
    use zip::write::{FileOptions, ZipWriter};

    fn archive_with(names: &[&str]) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for name in names {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(b"data").unwrap();
        }
        let cursor = zip.finish().unwrap();
        ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap()
    }

    #[test]
    fn test_validate_zip_path_valid() {
        assert!(validate_zip_path("xl/workbook.xml").is_ok());
        assert!(validate_zip_path("xl/media/image1.png").is_ok());
        assert!(validate_zip_path("word/document.xml").is_ok());
    }

    #[test]
    fn test_validate_zip_path_rejects() {
        assert!(validate_zip_path("").is_err());
        assert!(validate_zip_path("/etc/passwd").is_err());
        assert!(validate_zip_path("C:\\Windows\\system32").is_err());
        assert!(validate_zip_path("xl/../../etc/passwd").is_err());
        assert!(validate_zip_path("xl\\media\\image1.png").is_err());
    }

    #[test]
    fn test_check_archive_accepts_regular_archive() {
        let mut archive = archive_with(&["xl/workbook.xml", "xl/media/image1.png"]);
        assert!(SecurityConfig::default().check_archive(&mut archive).is_ok());
    }

    #[test]
    fn test_check_archive_file_count_limit() {
        let mut archive = archive_with(&["a.xml", "b.xml", "c.xml"]);
        let config = SecurityConfig {
            max_file_count: 2,
            ..SecurityConfig::default()
        };
        match config.check_archive(&mut archive) {
            Err(OfferError::SecurityViolation(msg)) => assert!(msg.contains("too many files")),
            other => panic!("Expected SecurityViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_check_archive_decompressed_size_limit() {
        let mut archive = archive_with(&["a.xml", "b.xml"]);
        let config = SecurityConfig {
            max_decompressed_size: 6,
            ..SecurityConfig::default()
        };
        match config.check_archive(&mut archive) {
            Err(OfferError::SecurityViolation(msg)) => assert!(msg.contains("decompressed size")),
            other => panic!("Expected SecurityViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_check_input_size() {
        let config = SecurityConfig {
            max_input_file_size: 10,
            ..SecurityConfig::default()
        };
        assert!(config.check_input_size(10).is_ok());
        assert!(config.check_input_size(11).is_err());
    }
}
