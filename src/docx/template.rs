//! Built-in Template Module
//!
//! テンプレート文書が用意されていない環境向けの、組み込みテンプレートを生成します。
//! 日付プレースホルダーの段落と、4列のヘッダー行+書式行を持つテーブルで構成されます。

use std::io::{Cursor, Write};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::error::OfferError;

/// 組み込みテンプレートのヘッダー
pub(crate) const DEFAULT_HEADERS: [&str; 4] = [
    "L.p.",
    "Rysunek (Widok od zewnątrz), wymiary",
    "Ilość sztuk",
    "OPIS",
];

/// 各列の幅（dxa）
const COLUMN_WIDTHS: [u32; 4] = [800, 4600, 1400, 3000];

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

/// 組み込みテンプレート（DOCX）のバイト列を生成する
///
/// # 使用例
///
/// ```rust
/// let template = xlsxoffer::default_template()?;
/// assert!(template.starts_with(b"PK"));
/// # Ok::<(), xlsxoffer::OfferError>(())
/// ```
pub fn default_template() -> Result<Vec<u8>, OfferError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", PACKAGE_RELS_XML.to_string()),
        ("word/document.xml", document_xml()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.to_string()),
    ];
    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

fn document_xml() -> String {
    let grid: String = COLUMN_WIDTHS
        .iter()
        .map(|w| format!(r#"<w:gridCol w:w="{}"/>"#, w))
        .collect();

    let header_cells: String = DEFAULT_HEADERS
        .iter()
        .zip(COLUMN_WIDTHS)
        .map(|(text, width)| {
            format!(
                r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="dxa"/></w:tcPr><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r></w:p></w:tc>"#,
                width, text
            )
        })
        .collect();

    let style_cells: String = COLUMN_WIDTHS
        .iter()
        .map(|width| {
            format!(
                r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="dxa"/><w:vAlign w:val="top"/></w:tcPr><w:p/></w:tc>"#,
                width
            )
        })
        .collect();

    let borders: String = ["top", "left", "bottom", "right", "insideH", "insideV"]
        .iter()
        .map(|side| format!(r#"<w:{} w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#, side))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"><w:body><w:p><w:r><w:t xml:space="preserve">Data: {{{{DATA}}}}</w:t></w:r></w:p><w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/><w:tblBorders>{borders}</w:tblBorders><w:tblLayout w:type="fixed"/></w:tblPr><w:tblGrid>{grid}</w:tblGrid><w:tr><w:trPr><w:tblHeader/></w:trPr>{header_cells}</w:tr><w:tr>{style_cells}</w:tr></w:tbl><w:p/><w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:right="850" w:bottom="1134" w:left="1134" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#,
        borders = borders,
        grid = grid,
        header_cells = header_cells,
        style_cells = style_cells,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::package::DocxPackage;
    use crate::docx::table;
    use crate::security::SecurityConfig;

    #[test]
    fn test_default_template_structure() {
        let bytes = default_template().unwrap();
        let package = DocxPackage::load(&bytes, &SecurityConfig::default()).unwrap();
        assert_eq!(package.main_document_path().unwrap(), "word/document.xml");

        let document = package.read_xml("word/document.xml").unwrap().unwrap();
        let body = document.root().unwrap().child("w:body").unwrap();

        let first = body.child("w:p").unwrap();
        assert_eq!(first.text_of("w:t"), "Data: {{DATA}}");

        let tbl = body.child("w:tbl").unwrap();
        let rows: Vec<_> = tbl.elements().filter(|e| e.is("w:tr")).collect();
        assert_eq!(rows.len(), 2);
        let headers: Vec<String> = table::cells(rows[0]).map(|c| c.text_of("w:t")).collect();
        assert_eq!(headers, DEFAULT_HEADERS);
        assert_eq!(table::grid_column_count(tbl), 4);
    }
}
