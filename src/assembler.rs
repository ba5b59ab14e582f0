//! Template Document Assembler Module
//!
//! テンプレート文書にポジション一覧を書き込み、新しいDOCXを生成するモジュール。
//!
//! 処理の流れ:
//!
//! 1. テンプレートをメモリ上に展開（呼び出しごとに新しいコピー）
//! 2. 日付プレースホルダーの置換
//! 3. ヘッダーマーカーを持つテーブルの特定
//! 4. ヘッダー行から下の行を作り直す
//! 5. ポジションごとに行を追加し、画像を配置
//! 6. ZIPとして書き出し

use crate::api::{ImageLayout, ImageWidth, RowTemplate};
use crate::docx::drawing::{self, DrawingIds};
use crate::docx::package::{part_dir, DocxPackage, Relationships, IMAGE_REL_TYPE};
use crate::docx::table;
use crate::docx::xml::{XmlElement, XmlNode};
use crate::error::OfferError;
use crate::security::SecurityConfig;
use crate::types::{ImageBlob, Item};

/// 1行に書き込むセル数（通し番号、名称、数量、説明）
const ITEM_CELLS: usize = 4;

/// 名称セルの位置
const NAME_CELL: usize = 1;

const RELS_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// 文書生成の設定
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AssemblyOptions {
    /// データテーブルを特定するヘッダーマーカー
    pub header_marker: String,
    /// 日付プレースホルダー
    pub date_placeholder: String,
    pub image_layout: ImageLayout,
    pub row_template: RowTemplate,
    pub image_width: ImageWidth,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            header_marker: "L.p.".to_string(),
            date_placeholder: "{{DATA}}".to_string(),
            image_layout: ImageLayout::BelowName,
            row_template: RowTemplate::HeaderOnly,
            image_width: ImageWidth::Pixels(500),
        }
    }
}

/// テンプレート文書アセンブラー
pub(crate) struct TemplateDocumentAssembler<'a> {
    options: &'a AssemblyOptions,
    security: SecurityConfig,
}

impl<'a> TemplateDocumentAssembler<'a> {
    pub fn new(options: &'a AssemblyOptions, security: SecurityConfig) -> Self {
        Self { options, security }
    }

    /// テンプレートにポジションを書き込んだ文書を生成する
    ///
    /// # 引数
    ///
    /// * `template` - テンプレートDOCXのバイト列（変更されない）
    /// * `items` - 書き込むポジション
    /// * `date_text` - プレースホルダーに埋め込む日付文字列
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<u8>)` - 生成したDOCX
    /// * `Err(OfferError::TemplateConfiguration)` - データテーブルや本文が見つからない場合
    pub fn assemble(
        &self,
        template: &[u8],
        items: &[Item],
        date_text: &str,
    ) -> Result<Vec<u8>, OfferError> {
        let mut package = DocxPackage::load(template, &self.security)?;
        let document_path = package.main_document_path()?;
        let mut document = package.read_xml(&document_path)?.ok_or_else(|| {
            OfferError::TemplateConfiguration(format!(
                "Template has no document part at {}",
                document_path
            ))
        })?;

        let body = document
            .root_mut()
            .and_then(|root| root.child_mut("w:body"))
            .ok_or_else(|| {
                OfferError::TemplateConfiguration("Template document has no body".to_string())
            })?;

        let replaced = replace_placeholder(body, &self.options.date_placeholder, date_text);
        log::debug!(
            "Replaced the date placeholder in {} paragraphs",
            replaced
        );

        let mut media = MediaWriter {
            ids: DrawingIds::scan(body),
            relationships: Relationships::for_part(&package, &document_path)?,
            media_dir: format!("{}media/", part_dir(&document_path)),
            width_emu: self.options.image_width.to_emu(),
            counter: 0,
            package: &mut package,
        };

        let marker = self.options.header_marker.as_str();
        let data_table = body
            .elements_mut()
            .find(|e| {
                e.is("w:tbl")
                    && e.child("w:tr")
                        .is_some_and(|row| table::first_cell_text(row).contains(marker))
            })
            .ok_or_else(|| {
                OfferError::TemplateConfiguration(format!(
                    "No table whose first cell contains {:?}",
                    marker
                ))
            })?;

        self.populate_table(data_table, items, &mut media)?;
        log::debug!("Wrote {} positions into the template table", items.len());

        let relationships = media.relationships;
        relationships.save(&mut package)?;
        package.ensure_default_content_type("rels", RELS_CONTENT_TYPE)?;
        package.set(&document_path, document.to_bytes()?);
        package.to_bytes()
    }

    /// テーブルの行をヘッダーから下へ作り直す
    fn populate_table(
        &self,
        data_table: &mut XmlElement,
        items: &[Item],
        media: &mut MediaWriter<'_>,
    ) -> Result<(), OfferError> {
        let span = table::grid_column_count(data_table);

        // 行以外の子要素（tblPr, tblGridなど）は位置を保つ
        let mut rows = Vec::new();
        let mut kept = Vec::with_capacity(data_table.children.len());
        let mut insert_at = None;
        for node in std::mem::take(&mut data_table.children) {
            match node {
                XmlNode::Element(e) if e.is("w:tr") => {
                    insert_at.get_or_insert(kept.len());
                    rows.push(e);
                }
                other => kept.push(other),
            }
        }

        let mut rows = rows.into_iter();
        let header = rows.next().ok_or_else(|| {
            OfferError::TemplateConfiguration("Data table has no header row".to_string())
        })?;

        let mut prototype = match self.options.row_template {
            RowTemplate::HeaderOnly => table::prototype_from_header(&header),
            RowTemplate::RetainStyleRow => {
                let mut row = rows.next().ok_or_else(|| {
                    OfferError::TemplateConfiguration(
                        "Data table has no style row below the header".to_string(),
                    )
                })?;
                table::clear_row(&mut row);
                row
            }
        };
        table::ensure_cells(&mut prototype, ITEM_CELLS);

        let span = span.max(table::cells(&prototype).count());

        let mut new_rows = vec![header];
        if items.is_empty() && self.options.row_template == RowTemplate::RetainStyleRow {
            new_rows.push(prototype.clone());
        }

        for item in items {
            let mut row = prototype.clone();
            let values = [
                item.sequence_number.to_string(),
                item.name.clone(),
                item.quantity.clone(),
                item.description.clone(),
            ];
            for (index, value) in values.iter().enumerate() {
                if let Some(cell) = table::cell_mut(&mut row, index) {
                    table::set_cell_text(cell, value);
                }
            }

            let Some(image) = &item.image else {
                new_rows.push(row);
                continue;
            };
            let picture = media.place(image)?;

            match self.options.image_layout {
                ImageLayout::MergedRow => {
                    let mut image_row = table::merged_row(&prototype, span);
                    if let Some(cell) = table::cell_mut(&mut image_row, 0) {
                        table::set_cell_picture(cell, picture);
                    }
                    new_rows.push(row);
                    new_rows.push(image_row);
                }
                ImageLayout::BelowName => {
                    if let Some(cell) = table::cell_mut(&mut row, NAME_CELL) {
                        table::append_picture_paragraph(cell, picture);
                    }
                    new_rows.push(row);
                }
            }
        }

        let insert_at = insert_at.unwrap_or(kept.len());
        let trailing = kept.split_off(insert_at);
        kept.extend(new_rows.into_iter().map(XmlNode::Element));
        kept.extend(trailing);
        data_table.children = kept;
        Ok(())
    }
}

/// 画像パーツの書き込みとリレーションシップの登録
struct MediaWriter<'p> {
    package: &'p mut DocxPackage,
    relationships: Relationships,
    ids: DrawingIds,
    media_dir: String,
    width_emu: i64,
    counter: u32,
}

impl MediaWriter<'_> {
    /// 画像をパッケージに追加し、文書に挿入する`w:r`要素を返す
    fn place(&mut self, image: &ImageBlob) -> Result<XmlElement, OfferError> {
        // テンプレートに同名のパーツがあれば番号を進める
        let file_name = loop {
            self.counter += 1;
            let candidate = format!("offer_image{}.{}", self.counter, image.extension);
            if !self
                .package
                .contains(&format!("{}{}", self.media_dir, candidate))
            {
                break candidate;
            }
        };

        self.package
            .set(&format!("{}{}", self.media_dir, file_name), image.data.clone());
        self.package
            .ensure_default_content_type(&image.extension, image.content_type())?;
        let rel_id = self
            .relationships
            .add(IMAGE_REL_TYPE, &format!("media/{}", file_name))?;

        let dimensions = drawing::pixel_dimensions(&image.data);
        if dimensions.is_none() {
            log::warn!(
                "Could not read the dimensions of {}; placing it as a square",
                image.entry_name
            );
        }
        let extent = drawing::display_extent(dimensions, self.width_emu);

        drawing::picture_run(&rel_id, self.ids.next_id(), &file_name, extent)
    }
}

/// 本文直下の段落のプレースホルダーを置換する
///
/// ランをまたいで分割されたプレースホルダーにも対応するため、段落内の
/// テキストを連結して置換し、結果を最初の`w:t`に書き込みます。
///
/// # 戻り値
///
/// 置換を行った段落の数
fn replace_placeholder(body: &mut XmlElement, placeholder: &str, replacement: &str) -> usize {
    let mut replaced = 0;
    for paragraph in body.elements_mut().filter(|e| e.is("w:p")) {
        let text = paragraph.text_of("w:t");
        if !text.contains(placeholder) {
            continue;
        }

        let new_text = text.replace(placeholder, replacement);
        let mut first = true;
        paragraph.walk_mut(&mut |e| {
            if !e.is("w:t") {
                return;
            }
            if first {
                e.set_own_text(new_text.as_str());
                e.set_attr("xml:space", "preserve");
                first = false;
            } else {
                e.set_own_text("");
            }
        });
        replaced += 1;
    }
    replaced
}
