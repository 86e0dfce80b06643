use crate::error::{CodecError, CodecResult};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A parsed XML element: tag, attributes in document order, text and children.
///
/// Built fresh for every payload and discarded once the engine has consumed it.
/// Mixed content is flattened: every text run directly inside an element is
/// concatenated into [`XmlElement::text`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

fn xml_error(e: impl std::fmt::Display) -> CodecError {
    CodecError::format("XML", e.to_string())
}

fn utf8(bytes: &[u8]) -> CodecResult<String> {
    std::str::from_utf8(bytes).map(str::to_string).map_err(xml_error)
}

impl XmlElement {
    pub fn new(tag: impl Into<String>) -> Self {
        XmlElement {
            tag: tag.into(),
            ..XmlElement::default()
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value of the same name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// First direct child with the given tag.
    #[must_use]
    pub fn child(&self, tag: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Direct children with the given tag, in document order.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Descendants with the given tag, in document order. The search does not
    /// continue below a matching element.
    #[must_use]
    pub fn descendants_named(&self, tag: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        collect_descendants(self, tag, &mut found);
        found
    }

    /// No text, no children and no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.children.is_empty() && self.attributes.is_empty()
    }

    /// Append a new child element and return it for further writing.
    pub fn push_child(&mut self, child: XmlElement) -> &mut XmlElement {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Parse a document and return its root element.
    ///
    /// # Errors
    ///
    /// `FormatError` for malformed XML, unbalanced tags or a document without
    /// a root element.
    pub fn parse(text: &str) -> CodecResult<XmlElement> {
        let mut reader = Reader::from_str(text);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(start) => stack.push(element_from_start(&start)?),
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    close(element, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| CodecError::format("XML", "unbalanced end tag"))?;
                    close(element, &mut stack, &mut root)?;
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(xml_error)?;
                    append_text(&mut stack, &text);
                }
                Event::CData(c) => {
                    let text = utf8(&c)?;
                    append_text(&mut stack, &text);
                }
                Event::Eof => break,
                // declarations, comments, processing instructions, doctype
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(CodecError::format("XML", "unclosed element"));
        }
        root.ok_or_else(|| CodecError::format("XML", "document has no root element"))
    }

    /// Render as single-line XML text without a declaration.
    ///
    /// # Errors
    ///
    /// `FormatError` when the writer fails.
    pub fn render(&self) -> CodecResult<String> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self)?;
        utf8(&writer.into_inner())
    }
}

fn element_from_start(start: &BytesStart<'_>) -> CodecResult<XmlElement> {
    let mut element = XmlElement::new(utf8(start.name().as_ref())?);
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        let key = utf8(attr.key.as_ref())?;
        let value = attr.unescape_value().map_err(xml_error)?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

/// Leaf text is kept verbatim; whitespace-only runs between child elements
/// are indentation and are dropped.
fn close(
    mut element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> CodecResult<()> {
    if !element.children.is_empty() && element.text.as_deref().is_some_and(|t| t.trim().is_empty()) {
        element.text = None;
    }
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(CodecError::format("XML", "multiple root elements")),
    }
    Ok(())
}

fn append_text(stack: &mut [XmlElement], text: &str) {
    if let Some(current) = stack.last_mut() {
        current.text.get_or_insert_with(String::new).push_str(text);
    }
}

fn collect_descendants<'a>(element: &'a XmlElement, tag: &str, found: &mut Vec<&'a XmlElement>) {
    for child in &element.children {
        if child.tag == tag {
            found.push(child);
        } else {
            collect_descendants(child, tag, found);
        }
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> CodecResult<()> {
    let mut start = BytesStart::new(element.tag.as_str());
    for (k, v) in &element.attributes {
        start.push_attribute((k.as_str(), v.as_str()));
    }
    let text = element.text.as_deref().filter(|t| !t.is_empty());
    if text.is_none() && element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(xml_error);
    }
    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    if let Some(text) = text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.tag.as_str())))
        .map_err(xml_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attributes_text_children() {
        let doc = r#"<?xml version="1.0"?><Book bookId="42"><Title>Dune &amp; more</Title><Tags/></Book>"#;
        let book = XmlElement::parse(doc).unwrap();
        assert_eq!(book.tag, "Book");
        assert_eq!(book.attribute("bookId"), Some("42"));
        assert_eq!(book.child("Title").and_then(|t| t.text.as_deref()), Some("Dune & more"));
        assert!(book.child("Tags").map(XmlElement::is_empty).unwrap_or(false));
    }

    #[test]
    fn test_leaf_text_kept_indentation_dropped() {
        let doc = "<Book>\n    <Title>  Dune  </Title>\n    <Blank> </Blank>\n</Book>\n";
        let book = XmlElement::parse(doc).unwrap();
        assert_eq!(book.text, None);
        assert_eq!(book.child("Title").and_then(|t| t.text.as_deref()), Some("  Dune  "));
        assert_eq!(book.child("Blank").and_then(|t| t.text.as_deref()), Some(" "));
    }

    #[test]
    fn test_render_is_single_line_and_escaped() {
        let mut book = XmlElement::new("Book");
        book.set_attribute("bookId", "42");
        book.push_child(XmlElement::new("Title").with_text("a < b"));
        book.push_child(XmlElement::new("Empty"));
        assert_eq!(
            book.render().unwrap(),
            r#"<Book bookId="42"><Title>a &lt; b</Title><Empty/></Book>"#
        );
    }

    #[test]
    fn test_render_parse_round_trip() {
        let mut root = XmlElement::new("Root");
        root.push_child(XmlElement::new("Item").with_text("1"));
        root.push_child(XmlElement::new("Item").with_text("2"));
        let parsed = XmlElement::parse(&root.render().unwrap()).unwrap();
        assert_eq!(parsed, root);
    }

    #[test]
    fn test_descendants_stop_at_match() {
        let doc = "<List><Group><Item><Item>inner</Item></Item></Group><Item/></List>";
        let list = XmlElement::parse(doc).unwrap();
        assert_eq!(list.descendants_named("Item").len(), 2);
        assert_eq!(list.children_named("Item").count(), 1);
    }

    #[test]
    fn test_malformed_documents() {
        assert!(XmlElement::parse("<a><b></a>").is_err());
        assert!(XmlElement::parse("").is_err());
        assert!(XmlElement::parse("<a/><b/>").is_err());
    }
}
