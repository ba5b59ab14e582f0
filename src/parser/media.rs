//! Media Extractor Module
//!
//! XLSXファイル（ZIPアーカイブ）から埋め込み画像を取り出すモジュール。
//! 画像の順序はエントリ名の辞書順のみで決まり、シート上の配置は考慮しません。

use rayon::prelude::*;
use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::error::OfferError;
use crate::security::SecurityConfig;
use crate::types::ImageBlob;

/// 埋め込みメディアのディレクトリ
const MEDIA_PREFIX: &str = "xl/media/";

/// 対象とする画像の拡張子
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// メディア抽出器
pub(crate) struct MediaExtractor {
    security: SecurityConfig,
}

impl MediaExtractor {
    pub fn new(security: SecurityConfig) -> Self {
        Self { security }
    }

    /// 埋め込み画像をエントリ名の辞書順で抽出する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<ImageBlob>)` - 画像一覧（メディアがない場合は空）
    /// * `Err(OfferError::MalformedContainer)` - ZIPアーカイブとして開けない場合
    /// * `Err(OfferError::SecurityViolation)` - アーカイブがセキュリティ制限を超える場合
    pub fn extract(&self, bytes: &[u8]) -> Result<Vec<ImageBlob>, OfferError> {
        self.security.check_input_size(bytes.len())?;

        let mut archive = open_archive(bytes)?;
        self.security.check_archive(&mut archive)?;

        let mut names: Vec<String> = archive
            .file_names()
            .filter(|name| is_media_image(name))
            .map(str::to_string)
            .collect();
        names.sort();

        log::debug!("Found {} embedded images under {}", names.len(), MEDIA_PREFIX);

        // 各エントリの読み込みを並列化
        // ワーカーごとにメモリ上のバイト列からアーカイブを開き直す
        names
            .par_iter()
            .map(|name| {
                let mut archive = open_archive(bytes)?;
                let mut entry = archive
                    .by_name(name)
                    .map_err(|e| OfferError::MalformedContainer(format!("{}: {}", name, e)))?;
                let mut data = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut data)?;
                Ok(ImageBlob::new(name.clone(), data))
            })
            .collect()
    }
}

fn open_archive(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>, OfferError> {
    ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| OfferError::MalformedContainer(format!("Not a valid XLSX archive: {}", e)))
}

/// エントリが埋め込み画像かどうか（拡張子は大文字小文字を区別しない）
fn is_media_image(name: &str) -> bool {
    if !name.starts_with(MEDIA_PREFIX) {
        return false;
    }
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{FileOptions, ZipWriter};

    fn archive_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn extract(bytes: &[u8]) -> Result<Vec<ImageBlob>, OfferError> {
        MediaExtractor::new(SecurityConfig::default()).extract(bytes)
    }

    #[test]
    fn test_is_media_image() {
        assert!(is_media_image("xl/media/image1.png"));
        assert!(is_media_image("xl/media/image2.JPG"));
        assert!(is_media_image("xl/media/photo.jpeg"));
        assert!(!is_media_image("xl/media/image3.emf"));
        assert!(!is_media_image("xl/drawings/image1.png"));
        assert!(!is_media_image("xl/media/noextension"));
    }

    #[test]
    fn test_extract_sorted_lexicographically() {
        let bytes = archive_with(&[
            ("xl/media/image2.png", b"two"),
            ("xl/workbook.xml", b"<workbook/>"),
            ("xl/media/image10.png", b"ten"),
            ("xl/media/image1.jpeg", b"one"),
            ("xl/media/image3.emf", b"vector"),
        ]);

        let images = extract(&bytes).unwrap();
        let names: Vec<&str> = images.iter().map(|i| i.entry_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "xl/media/image1.jpeg",
                "xl/media/image10.png",
                "xl/media/image2.png"
            ]
        );
        assert_eq!(images[0].data, b"one");
        assert_eq!(images[0].extension, "jpeg");
    }

    #[test]
    fn test_extract_is_stable() {
        let bytes = archive_with(&[
            ("xl/media/image2.png", b"b"),
            ("xl/media/image1.png", b"a"),
        ]);
        assert_eq!(extract(&bytes).unwrap(), extract(&bytes).unwrap());
    }

    #[test]
    fn test_extract_without_media_is_empty() {
        let bytes = archive_with(&[("xl/workbook.xml", b"<workbook/>")]);
        assert!(extract(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_extract_rejects_non_archive() {
        match extract(b"definitely not a zip") {
            Err(OfferError::MalformedContainer(_)) => {}
            other => panic!("Expected MalformedContainer, got {:?}", other),
        }
    }
}
