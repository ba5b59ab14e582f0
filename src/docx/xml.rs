//! XML Tree Module
//!
//! quick-xmlのイベントから組み立てる、所有権を持つ最小限のXML要素ツリー。
//! テンプレートの`word/document.xml`を読み込み、行の再構築や置換を行った後に
//! そのまま書き戻すために使用します。

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;

use crate::error::OfferError;

/// XMLノード
#[derive(Debug, Clone)]
pub(crate) enum XmlNode {
    /// 要素
    Element(XmlElement),
    /// テキスト（アンエスケープ済み）
    Text(String),
    /// 宣言、コメント、CDATA、処理命令など（そのまま書き戻す）
    Raw(Event<'static>),
}

/// XML要素
///
/// 要素名は名前空間接頭辞付きの修飾名（例: `w:tbl`）で保持します。
#[derive(Debug, Clone, Default)]
pub(crate) struct XmlElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// 属性を追加した要素を返す
    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// 子要素を追加した要素を返す
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// テキストを追加した要素を返す
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 属性を設定（既存の場合は上書き）
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some(attr) => attr.1 = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// 子要素を順に返す
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// 指定名の最初の子要素
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.is(name))
    }

    /// 指定名の子要素をすべて削除
    pub fn remove_children(&mut self, name: &str) {
        self.children
            .retain(|node| !matches!(node, XmlNode::Element(e) if e.is(name)));
    }

    /// 直下のテキストノードを連結した値
    pub fn own_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// 直下のテキストを置き換える
    pub fn set_own_text(&mut self, text: impl Into<String>) {
        self.children.retain(|node| !matches!(node, XmlNode::Text(_)));
        let text = text.into();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text));
        }
    }

    /// 子孫要素を文書順（前順）に訪問する
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a XmlElement)) {
        visit(self);
        for child in self.elements() {
            child.walk(visit);
        }
    }

    /// 子孫要素を文書順に訪問する（可変）
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut XmlElement)) {
        visit(self);
        for child in self.elements_mut() {
            child.walk_mut(visit);
        }
    }

    /// 子孫のすべての`name`要素の直下テキストを連結する
    pub fn text_of(&self, name: &str) -> String {
        let mut text = String::new();
        self.walk(&mut |e| {
            if e.is(name) {
                text.push_str(&e.own_text());
            }
        });
        text
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, OfferError> {
        let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::InvalidAttr)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value);
            let value = quick_xml::escape::unescape(&raw)
                .map_err(quick_xml::Error::from)?
                .into_owned();
            element.attrs.push((key, value));
        }
        Ok(element)
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), OfferError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for child in &self.children {
            child.write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

impl XmlNode {
    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), OfferError> {
        match self {
            XmlNode::Element(element) => element.write_to(writer),
            XmlNode::Text(text) => {
                writer.write_event(Event::Text(BytesText::new(text)))?;
                Ok(())
            }
            XmlNode::Raw(event) => {
                writer.write_event(event)?;
                Ok(())
            }
        }
    }
}

/// XML文書
///
/// ルート要素の前後にある宣言などのノードも保持します。
#[derive(Debug, Clone)]
pub(crate) struct XmlDocument {
    nodes: Vec<XmlNode>,
}

impl XmlDocument {
    /// XML文字列を解析する
    pub fn parse(xml: &str) -> Result<Self, OfferError> {
        Ok(Self {
            nodes: parse_nodes(xml)?,
        })
    }

    /// ルート要素
    pub fn root(&self) -> Option<&XmlElement> {
        self.nodes.iter().find_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn root_mut(&mut self) -> Option<&mut XmlElement> {
        self.nodes.iter_mut().find_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// バイト列に書き出す
    pub fn to_bytes(&self) -> Result<Vec<u8>, OfferError> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.nodes {
            node.write_to(&mut writer)?;
        }
        Ok(writer.into_inner())
    }
}

/// 断片（単一要素）を解析する
pub(crate) fn parse_fragment(xml: &str) -> Result<XmlElement, OfferError> {
    parse_nodes(xml)?
        .into_iter()
        .find_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
        .ok_or_else(|| OfferError::Unexpected("XML fragment has no element".to_string()))
}

fn parse_nodes(xml: &str) -> Result<Vec<XmlNode>, OfferError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut roots = Vec::new();

    loop {
        let node = match reader.read_event()? {
            Event::Start(e) => {
                stack.push(XmlElement::from_start(&e)?);
                continue;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    OfferError::Unexpected("Unbalanced end tag in XML part".to_string())
                })?;
                XmlNode::Element(element)
            }
            Event::Empty(e) => XmlNode::Element(XmlElement::from_start(&e)?),
            Event::Text(e) => XmlNode::Text(e.unescape()?.into_owned()),
            Event::Eof => break,
            other => XmlNode::Raw(other.into_owned()),
        };

        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }

    if !stack.is_empty() {
        return Err(OfferError::Unexpected(
            "Unclosed element in XML part".to_string(),
        ));
    }

    Ok(roots)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t xml:space="preserve">A &amp; B</w:t></w:r></w:p><w:p/></w:body></w:document>"#;

    #[test]
    fn test_parse_and_navigate() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        let root = doc.root().unwrap();
        assert!(root.is("w:document"));
        let body = root.child("w:body").unwrap();
        assert_eq!(body.elements().count(), 2);
        assert_eq!(body.text_of("w:t"), "A & B");
        let t = body.child("w:p").unwrap().child("w:r").unwrap().child("w:t").unwrap();
        assert_eq!(t.attr("xml:space"), Some("preserve"));
    }

    #[test]
    fn test_round_trip_preserves_content() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        let out = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert!(out.starts_with("<?xml"));
        assert!(out.contains("A &amp; B"));
        assert!(out.contains("<w:p/>"));

        let again = XmlDocument::parse(&out).unwrap();
        assert_eq!(again.root().unwrap().text_of("w:t"), "A & B");
    }

    #[test]
    fn test_set_attr_and_text() {
        let mut t = XmlElement::new("w:t").with_text("old");
        t.set_attr("xml:space", "preserve");
        t.set_attr("xml:space", "default");
        t.set_own_text("new <value>");
        assert_eq!(t.attrs.len(), 1);
        assert_eq!(t.attr("xml:space"), Some("default"));
        assert_eq!(t.own_text(), "new <value>");
    }

    #[test]
    fn test_attribute_entities_are_unescaped() {
        let el = parse_fragment(r#"<wp:docPr id="1" descr="A &amp; B &quot;x&quot;"/>"#).unwrap();
        assert_eq!(el.attr("descr"), Some(r#"A & B "x""#));

        let doc = XmlDocument::parse(r#"<a b="1 &lt; 2"/>"#).unwrap();
        assert_eq!(doc.root().unwrap().attr("b"), Some("1 < 2"));
        let out = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert!(out.contains("1 &lt; 2"));
    }

    #[test]
    fn test_remove_children() {
        let mut tr = parse_fragment("<w:tr><w:trPr/><w:tc/><w:tc/></w:tr>").unwrap();
        tr.remove_children("w:tc");
        assert_eq!(tr.elements().count(), 1);
        assert!(tr.child("w:trPr").is_some());
    }

    #[test]
    fn test_unbalanced_xml_is_error() {
        assert!(XmlDocument::parse("<a><b></a>").is_err());
        assert!(XmlDocument::parse("<a>").is_err());
    }
}
