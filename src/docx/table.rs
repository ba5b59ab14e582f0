//! Table Row Module
//!
//! テンプレートのテーブル行（`w:tr`）とセル（`w:tc`）を操作するヘルパー群。

use crate::docx::xml::{XmlElement, XmlNode};

/// 行のセルを順に返す
pub(crate) fn cells(row: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    row.elements().filter(|e| e.is("w:tc"))
}

/// 行の先頭セルのテキスト
pub(crate) fn first_cell_text(row: &XmlElement) -> String {
    cells(row)
        .next()
        .map(|cell| cell.text_of("w:t"))
        .unwrap_or_default()
}

/// `i`番目のセル（0始まり）
pub(crate) fn cell_mut(row: &mut XmlElement, index: usize) -> Option<&mut XmlElement> {
    row.elements_mut().filter(|e| e.is("w:tc")).nth(index)
}

/// セルのテキストを置き換える
///
/// `w:tcPr`と最初の段落の`w:pPr`、最初のランの`w:rPr`は維持し、
/// 本文は1段落1ランに置き換えます。空文字でも`w:rPr`を持つランは残すため、
/// 空にした行を雛形として再利用しても文字書式は失われません。
pub(crate) fn set_cell_text(cell: &mut XmlElement, text: &str) {
    let first_paragraph = cell.child("w:p");
    let paragraph_props = first_paragraph.and_then(|p| p.child("w:pPr")).cloned();
    let run_props = first_paragraph
        .and_then(|p| p.child("w:r"))
        .and_then(|r| r.child("w:rPr"))
        .cloned();

    cell.children
        .retain(|node| matches!(node, XmlNode::Element(e) if e.is("w:tcPr")));

    let mut paragraph = XmlElement::new("w:p");
    if let Some(props) = paragraph_props {
        paragraph = paragraph.with_child(props);
    }
    if !text.is_empty() || run_props.is_some() {
        let mut run = XmlElement::new("w:r");
        if let Some(props) = run_props {
            run = run.with_child(props);
        }
        if !text.is_empty() {
            run = run.with_child(
                XmlElement::new("w:t")
                    .with_attr("xml:space", "preserve")
                    .with_text(text),
            );
        }
        paragraph = paragraph.with_child(run);
    }
    cell.children.push(XmlNode::Element(paragraph));
}

/// 行のすべてのセルを空にする
pub(crate) fn clear_row(row: &mut XmlElement) {
    for cell in row.elements_mut().filter(|e| e.is("w:tc")) {
        set_cell_text(cell, "");
    }
}

/// ヘッダー行から新しい行の雛形を作る
///
/// 列幅や罫線は維持し、見出し行の繰り返し指定（`w:tblHeader`）と
/// 見出し専用の書式（網掛け、中央揃え、文字書式）は外します。
pub(crate) fn prototype_from_header(header: &XmlElement) -> XmlElement {
    let mut row = header.clone();
    if let Some(props) = row.child_mut("w:trPr") {
        props.remove_children("w:tblHeader");
    }
    for cell in row.elements_mut().filter(|e| e.is("w:tc")) {
        strip_heading_format(cell);
    }
    clear_row(&mut row);
    row
}

fn strip_heading_format(cell: &mut XmlElement) {
    if let Some(props) = cell.child_mut("w:tcPr") {
        props.remove_children("w:shd");
    }
    for paragraph in cell.elements_mut().filter(|e| e.is("w:p")) {
        if let Some(props) = paragraph.child_mut("w:pPr") {
            props.remove_children("w:jc");
            props.remove_children("w:rPr");
        }
        for run in paragraph.elements_mut().filter(|e| e.is("w:r")) {
            run.remove_children("w:rPr");
        }
    }
}

/// セルが`count`個に満たない場合、空のセルを追加する
pub(crate) fn ensure_cells(row: &mut XmlElement, count: usize) {
    let existing = cells(row).count();
    if existing >= count {
        return;
    }

    let template = cells(row).last().cloned().map(|mut cell| {
        set_cell_text(&mut cell, "");
        cell
    });
    for _ in existing..count {
        let cell = template.clone().unwrap_or_else(|| {
            XmlElement::new("w:tc").with_child(XmlElement::new("w:p"))
        });
        row.children.push(XmlNode::Element(cell));
    }
}

/// テーブルのグリッド列数
///
/// `w:tblGrid`がない場合は先頭行のセル数（`w:gridSpan`込み）を使用します。
pub(crate) fn grid_column_count(table: &XmlElement) -> usize {
    let from_grid = table
        .child("w:tblGrid")
        .map(|grid| grid.elements().filter(|e| e.is("w:gridCol")).count())
        .unwrap_or(0);
    if from_grid > 0 {
        return from_grid;
    }

    table
        .child("w:tr")
        .map(|row| {
            cells(row)
                .map(|cell| {
                    cell.child("w:tcPr")
                        .and_then(|props| props.child("w:gridSpan"))
                        .and_then(|span| span.attr("w:val"))
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(1)
                })
                .sum()
        })
        .unwrap_or(1)
        .max(1)
}

/// 全列を結合した1セルの行を作る
///
/// 雛形行の行書式と先頭セルの書式を引き継ぎ、幅指定は`w:gridSpan`に置き換えます。
pub(crate) fn merged_row(prototype: &XmlElement, span: usize) -> XmlElement {
    let mut row = prototype.clone();
    let mut first_cell = cells(&row).next().cloned().unwrap_or_else(|| {
        XmlElement::new("w:tc").with_child(XmlElement::new("w:p"))
    });
    row.remove_children("w:tc");

    set_cell_text(&mut first_cell, "");
    let mut props = first_cell
        .child("w:tcPr")
        .cloned()
        .unwrap_or_else(|| XmlElement::new("w:tcPr"));
    for name in ["w:tcW", "w:gridSpan", "w:hMerge", "w:vMerge"] {
        props.remove_children(name);
    }
    // w:gridSpanはw:cnfStyleの直後
    let position = usize::from(props.child("w:cnfStyle").is_some());
    props.children.insert(
        position,
        XmlNode::Element(XmlElement::new("w:gridSpan").with_attr("w:val", span.to_string())),
    );

    first_cell.remove_children("w:tcPr");
    first_cell.children.insert(0, XmlNode::Element(props));
    row.children.push(XmlNode::Element(first_cell));
    row
}

/// セル末尾に画像用の段落を追加する
///
/// 段落書式はセルの最初の段落から引き継ぎます。
pub(crate) fn append_picture_paragraph(cell: &mut XmlElement, picture_run: XmlElement) {
    let mut paragraph = XmlElement::new("w:p");
    if let Some(props) = cell.child("w:p").and_then(|p| p.child("w:pPr")).cloned() {
        paragraph = paragraph.with_child(props);
    }
    cell.children
        .push(XmlNode::Element(paragraph.with_child(picture_run)));
}

/// セルの内容を画像の段落1つに置き換える
pub(crate) fn set_cell_picture(cell: &mut XmlElement, picture_run: XmlElement) {
    set_cell_text(cell, "");
    let mut paragraph = cell.child("w:p").cloned().unwrap_or_else(|| XmlElement::new("w:p"));
    paragraph.remove_children("w:r");
    cell.remove_children("w:p");
    cell.children
        .push(XmlNode::Element(paragraph.with_child(picture_run)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::xml::parse_fragment;

    const HEADER: &str = r#"<w:tr><w:trPr><w:tblHeader/><w:cantSplit/></w:trPr><w:tc><w:tcPr><w:tcW w:w="800" w:type="dxa"/></w:tcPr><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>L.p.</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Rysunek</w:t></w:r><w:r><w:t> (Widok)</w:t></w:r></w:p></w:tc></w:tr>"#;

    #[test]
    fn test_first_cell_text() {
        let row = parse_fragment(HEADER).unwrap();
        assert_eq!(first_cell_text(&row), "L.p.");
        assert_eq!(cells(&row).nth(1).unwrap().text_of("w:t"), "Rysunek (Widok)");
    }

    #[test]
    fn test_set_cell_text_keeps_formatting() {
        let mut row = parse_fragment(HEADER).unwrap();
        let cell = cell_mut(&mut row, 0).unwrap();
        set_cell_text(cell, "7");

        assert!(cell.child("w:tcPr").is_some());
        let paragraph = cell.child("w:p").unwrap();
        assert!(paragraph.child("w:pPr").is_some());
        let run = paragraph.child("w:r").unwrap();
        assert!(run.child("w:rPr").is_some());
        assert_eq!(run.child("w:t").unwrap().attr("xml:space"), Some("preserve"));
        assert_eq!(cell.text_of("w:t"), "7");
    }

    #[test]
    fn test_cleared_row_keeps_run_properties() {
        let mut row = parse_fragment(
            r#"<w:tr><w:tc><w:p><w:r><w:rPr><w:sz w:val="16"/><w:rFonts w:ascii="Arial"/></w:rPr><w:t>x</w:t></w:r></w:p></w:tc></w:tr>"#,
        )
        .unwrap();
        clear_row(&mut row);
        assert_eq!(row.text_of("w:t"), "");

        let cell = cell_mut(&mut row, 0).unwrap();
        set_cell_text(cell, "Poz. 1");
        let run = cell.child("w:p").unwrap().child("w:r").unwrap();
        let props = run.child("w:rPr").unwrap();
        assert_eq!(props.child("w:sz").unwrap().attr("w:val"), Some("16"));
        assert!(props.child("w:rFonts").is_some());
        assert_eq!(cell.text_of("w:t"), "Poz. 1");
    }

    #[test]
    fn test_prototype_from_header() {
        let header = parse_fragment(HEADER).unwrap();
        let prototype = prototype_from_header(&header);

        let props = prototype.child("w:trPr").unwrap();
        assert!(props.child("w:tblHeader").is_none());
        assert!(props.child("w:cantSplit").is_some());
        assert_eq!(cells(&prototype).count(), 2);
        assert_eq!(prototype.text_of("w:t"), "");
        // 見出し書式は引き継がない
        let cell = cells(&prototype).next().unwrap();
        assert!(cell.child("w:tcPr").unwrap().child("w:tcW").is_some());
        let paragraph = cell.child("w:p").unwrap();
        assert!(paragraph.child("w:pPr").unwrap().child("w:jc").is_none());
        assert!(paragraph.child("w:r").is_none());
        // 元の行は変更されない
        assert_eq!(first_cell_text(&header), "L.p.");
    }

    #[test]
    fn test_ensure_cells_appends_missing() {
        let mut row = parse_fragment(HEADER).unwrap();
        ensure_cells(&mut row, 4);
        assert_eq!(cells(&row).count(), 4);
        assert_eq!(cells(&row).nth(3).unwrap().text_of("w:t"), "");

        let mut bare = XmlElement::new("w:tr");
        ensure_cells(&mut bare, 2);
        assert_eq!(cells(&bare).count(), 2);
    }

    #[test]
    fn test_grid_column_count() {
        let table = parse_fragment(
            r#"<w:tbl><w:tblGrid><w:gridCol/><w:gridCol/><w:gridCol/></w:tblGrid></w:tbl>"#,
        )
        .unwrap();
        assert_eq!(grid_column_count(&table), 3);

        let table = parse_fragment(
            r#"<w:tbl><w:tr><w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p/></w:tc><w:tc><w:p/></w:tc></w:tr></w:tbl>"#,
        )
        .unwrap();
        assert_eq!(grid_column_count(&table), 3);
    }

    #[test]
    fn test_merged_row_spans_grid() {
        let header = parse_fragment(HEADER).unwrap();
        let row = merged_row(&prototype_from_header(&header), 4);

        assert_eq!(cells(&row).count(), 1);
        let props = cells(&row).next().unwrap().child("w:tcPr").unwrap();
        assert_eq!(props.child("w:gridSpan").unwrap().attr("w:val"), Some("4"));
        assert!(props.child("w:tcW").is_none());
    }

    #[test]
    fn test_append_picture_paragraph() {
        let mut row = parse_fragment(HEADER).unwrap();
        let cell = cell_mut(&mut row, 0).unwrap();
        append_picture_paragraph(cell, XmlElement::new("w:r"));

        let paragraphs: Vec<_> = cell.elements().filter(|e| e.is("w:p")).collect();
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[1].child("w:pPr").is_some());
        assert!(paragraphs[1].child("w:r").is_some());
    }

    #[test]
    fn test_set_cell_picture_replaces_content() {
        let mut row = parse_fragment(HEADER).unwrap();
        let cell = cell_mut(&mut row, 0).unwrap();
        set_cell_picture(cell, XmlElement::new("w:r"));

        let paragraphs: Vec<_> = cell.elements().filter(|e| e.is("w:p")).collect();
        assert_eq!(paragraphs.len(), 1);
        assert!(paragraphs[0].child("w:pPr").is_some());
        assert_eq!(cell.text_of("w:t"), "");
    }
}
