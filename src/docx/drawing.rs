//! Inline Picture Module
//!
//! 画像を本文中にインライン配置するための`w:drawing`要素を生成するモジュール。

use std::io::Cursor;

use crate::docx::xml::{parse_fragment, XmlElement};
use crate::error::OfferError;

const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// 画像ヘッダーから(幅, 高さ)のピクセル数を読み取る
///
/// 画像全体のデコードは行いません。読み取れない場合は`None`。
pub(crate) fn pixel_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
        .filter(|(w, h)| *w > 0 && *h > 0)
}

/// 固定幅に対する表示サイズ（EMU）
///
/// 高さは縦横比を保って算出します。寸法が不明な場合は正方形。
pub(crate) fn display_extent(dimensions: Option<(u32, u32)>, width_emu: i64) -> (i64, i64) {
    match dimensions {
        Some((w, h)) => {
            let height = (width_emu as f64 * h as f64 / w as f64).round() as i64;
            (width_emu, height.max(1))
        }
        None => (width_emu, width_emu),
    }
}

/// `wp:docPr`のID採番
///
/// 文書内で既に使われている最大値の次から払い出します。
#[derive(Debug)]
pub(crate) struct DrawingIds {
    next: u32,
}

impl DrawingIds {
    /// 文書ツリー内の既存の`wp:docPr`を走査して初期化する
    pub fn scan(root: &XmlElement) -> Self {
        let mut max = 0u32;
        root.walk(&mut |e| {
            if e.is("wp:docPr") {
                if let Some(id) = e.attr("id").and_then(|v| v.parse::<u32>().ok()) {
                    max = max.max(id);
                }
            }
        });
        Self { next: max + 1 }
    }

    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// インライン画像を含む`w:r`要素を生成する
pub(crate) fn picture_run(
    rel_id: &str,
    doc_pr_id: u32,
    file_name: &str,
    (cx, cy): (i64, i64),
) -> Result<XmlElement, OfferError> {
    let name = format!("Picture {}", doc_pr_id);
    let descr = quick_xml::escape::escape(file_name);
    let xml = format!(
        r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0" xmlns:wp="{wp}" xmlns:a="{a}" xmlns:pic="{pic}" xmlns:r="{r}"><wp:extent cx="{cx}" cy="{cy}"/><wp:effectExtent l="0" t="0" r="0" b="0"/><wp:docPr id="{id}" name="{name}" descr="{descr}"/><wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr><a:graphic><a:graphicData uri="{pic}"><pic:pic><pic:nvPicPr><pic:cNvPr id="0" name="{descr}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
        wp = WP_NS,
        a = A_NS,
        pic = PIC_NS,
        r = R_NS,
        cx = cx,
        cy = cy,
        id = doc_pr_id,
        name = name,
        descr = descr,
        rel_id = rel_id,
    );
    parse_fragment(&xml)
}
