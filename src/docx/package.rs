//! DOCX Package Module
//!
//! テンプレート文書（OPCパッケージ = ZIPアーカイブ）をメモリ上に展開し、
//! パーツの差し替え、リレーションシップ・コンテンツタイプの追加、
//! 再シリアライズを行うモジュール。

use std::io::{Cursor, Read, Write};
use zip::write::{FileOptions, ZipWriter};
use zip::{CompressionMethod, ZipArchive};

use crate::docx::xml::{XmlDocument, XmlElement};
use crate::error::OfferError;
use crate::security::SecurityConfig;

const PACKAGE_RELS: &str = "_rels/.rels";
const CONTENT_TYPES: &str = "[Content_Types].xml";
const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";
pub(crate) const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// メモリ上のDOCXパッケージ
///
/// エントリは元のアーカイブの順序を保持し、新しいパーツは末尾に追加されます。
#[derive(Debug, Clone)]
pub(crate) struct DocxPackage {
    entries: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    /// テンプレートのバイト列からパッケージを読み込む
    ///
    /// ZIPとして開けない場合はテンプレート資産の問題として扱います。
    pub fn load(bytes: &[u8], security: &SecurityConfig) -> Result<Self, OfferError> {
        security.check_input_size(bytes.len())?;

        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
            OfferError::TemplateConfiguration(format!("Template is not a DOCX archive: {}", e))
        })?;
        security.check_archive(&mut archive)?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push((file.name().to_string(), data));
        }

        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// パーツを設定する（既存なら差し替え、なければ末尾に追加）
    pub fn set(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = data,
            None => self.entries.push((name.to_string(), data)),
        }
    }

    /// XMLパーツを解析する
    pub fn read_xml(&self, name: &str) -> Result<Option<XmlDocument>, OfferError> {
        match self.get(name) {
            Some(data) => {
                let xml = std::str::from_utf8(data).map_err(|e| {
                    OfferError::TemplateConfiguration(format!("{} is not UTF-8: {}", name, e))
                })?;
                Ok(Some(XmlDocument::parse(xml)?))
            }
            None => Ok(None),
        }
    }

    /// メイン文書パーツのパス
    ///
    /// `_rels/.rels`のofficeDocumentリレーションシップから解決し、
    /// 見つからない場合は`word/document.xml`を使用します。
    pub fn main_document_path(&self) -> Result<String, OfferError> {
        if let Some(rels) = self.read_xml(PACKAGE_RELS)? {
            if let Some(root) = rels.root() {
                let target = root
                    .elements()
                    .filter(|e| e.is("Relationship"))
                    .find(|e| e.attr("Type").is_some_and(|t| t.ends_with(OFFICE_DOCUMENT_REL)))
                    .and_then(|e| e.attr("Target"));
                if let Some(target) = target {
                    return Ok(target.trim_start_matches('/').to_string());
                }
            }
        }
        Ok(DEFAULT_DOCUMENT_PART.to_string())
    }

    /// コンテンツタイプに拡張子の既定値を登録する（登録済みなら何もしない）
    pub fn ensure_default_content_type(
        &mut self,
        extension: &str,
        content_type: &str,
    ) -> Result<(), OfferError> {
        let mut types = self.read_xml(CONTENT_TYPES)?.ok_or_else(|| {
            OfferError::TemplateConfiguration(format!("Template has no {}", CONTENT_TYPES))
        })?;
        let root = types.root_mut().ok_or_else(|| {
            OfferError::TemplateConfiguration(format!("{} is empty", CONTENT_TYPES))
        })?;

        let registered = root.elements().any(|e| {
            e.is("Default")
                && e.attr("Extension")
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        });
        if registered {
            return Ok(());
        }

        root.children.insert(
            0,
            crate::docx::xml::XmlNode::Element(
                XmlElement::new("Default")
                    .with_attr("Extension", extension)
                    .with_attr("ContentType", content_type),
            ),
        );
        self.set(CONTENT_TYPES, types.to_bytes()?);
        Ok(())
    }

    /// パッケージをZIPとして書き出す
    pub fn to_bytes(&self) -> Result<Vec<u8>, OfferError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, data) in &self.entries {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

/// パーツのリレーションシップ（`*.rels`）
#[derive(Debug, Clone)]
pub(crate) struct Relationships {
    path: String,
    document: XmlDocument,
}

impl Relationships {
    /// パーツに対応するリレーションシップを読み込む（なければ空で作成）
    pub fn for_part(package: &DocxPackage, part_path: &str) -> Result<Self, OfferError> {
        let path = rels_path_for(part_path);
        let document = match package.read_xml(&path)? {
            Some(document) => document,
            None => XmlDocument::parse(&format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}"></Relationships>"#,
                RELS_NS
            ))?,
        };
        Ok(Self { path, document })
    }

    /// 未使用の`rIdN`を返す
    fn next_id(&self) -> String {
        let max = self
            .document
            .root()
            .map(|root| {
                root.elements()
                    .filter_map(|e| e.attr("Id"))
                    .filter_map(|id| id.strip_prefix("rId"))
                    .filter_map(|n| n.parse::<u32>().ok())
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);
        format!("rId{}", max + 1)
    }

    /// リレーションシップを追加し、そのIDを返す
    pub fn add(&mut self, rel_type: &str, target: &str) -> Result<String, OfferError> {
        let id = self.next_id();
        let root = self.document.root_mut().ok_or_else(|| {
            OfferError::TemplateConfiguration(format!("{} has no root element", self.path))
        })?;
        root.children.push(crate::docx::xml::XmlNode::Element(
            XmlElement::new("Relationship")
                .with_attr("Id", id.as_str())
                .with_attr("Type", rel_type)
                .with_attr("Target", target),
        ));
        Ok(id)
    }

    /// パッケージに書き戻す
    pub fn save(&self, package: &mut DocxPackage) -> Result<(), OfferError> {
        package.set(&self.path, self.document.to_bytes()?);
        Ok(())
    }
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`
pub(crate) fn rels_path_for(part_path: &str) -> String {
    match part_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_path),
    }
}

/// パーツのディレクトリ（末尾の`/`付き、ルートなら空文字列）
pub(crate) fn part_dir(part_path: &str) -> &str {
    match part_path.rfind('/') {
        Some(idx) => &part_path[..=idx],
        None => "",
    }
}
