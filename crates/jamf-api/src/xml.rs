// XML request bodies and response parsing
//
// The Classic API accepts XML on POST/PUT and answers writes with a tiny
// XML document carrying the object id. Request bodies are built as an
// element tree and rendered in one pass; text is escaped on output.

use std::fmt::{self, Display, Write as _};

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// One element of an XML request body.
///
/// An element holds either text or children. Rendering an element with
/// neither produces a self-closing tag, which the server reads as "empty".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    name: String,
    text: Option<String>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Create an element containing text.
    pub fn with_text(name: impl Into<String>, text: impl Display) -> Self {
        Self {
            name: name.into(),
            text: Some(text.to_string()),
            children: Vec::new(),
        }
    }

    /// Append a child element (builder form).
    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Append a text child (builder form).
    pub fn text_child(self, name: &str, text: impl Display) -> Self {
        self.child(Self::with_text(name, text))
    }

    /// Append a text child, or an empty element when the value is absent.
    pub fn opt_child<T: Display>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.text_child(name, v),
            None => self.child(Self::new(name)),
        }
    }

    /// Append a `true`/`false` child.
    pub fn bool_child(self, name: &str, value: bool) -> Self {
        self.text_child(name, value)
    }

    /// Append a child element in place.
    pub fn push(&mut self, child: XmlElement) -> &mut Self {
        self.children.push(child);
        self
    }

    /// Append every element of an iterator as children.
    pub fn extend(mut self, children: impl IntoIterator<Item = XmlElement>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// Find a descendant by slash-separated path, e.g. `"general/name"`.
    pub fn find(&self, path: &str) -> Option<&XmlElement> {
        let mut current = self;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current = current.children.iter().find(|c| c.name == part)?;
        }
        Some(current)
    }

    /// Text of a descendant, if present.
    pub fn find_text(&self, path: &str) -> Option<&str> {
        self.find(path).and_then(XmlElement::text)
    }

    /// Render the element without an XML declaration.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.render(&mut out);
        out
    }

    /// Render a complete document (declaration + root element).
    pub fn to_document(&self) -> String {
        let mut out = String::from(XML_DECLARATION);
        self.render(&mut out);
        out
    }

    fn render(&self, out: &mut String) {
        match (&self.text, self.children.is_empty()) {
            (Some(text), _) => {
                let _ = write!(out, "<{0}>{1}</{0}>", self.name, escape(text.as_str()));
            }
            (None, true) => {
                let _ = write!(out, "<{}/>", self.name);
            }
            (None, false) => {
                let _ = write!(out, "<{}>", self.name);
                for child in &self.children {
                    child.render(out);
                }
                let _ = write!(out, "</{}>", self.name);
            }
        }
    }
}

impl Display for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string())
    }
}

/// Extract the first `<id>` value from a write response.
///
/// POST and PUT answer with e.g. `<policy><id>42</id></policy>`.
pub fn parse_id(body: &str) -> Option<i64> {
    collect_text(body, "id")
        .into_iter()
        .next()
        .and_then(|id| id.parse().ok())
}

/// Collect the trimmed text of every element named `tag`, in document order.
///
/// Unreadable input yields whatever was collected before the error.
pub fn collect_text(body: &str, tag: &str) -> Vec<String> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut found = Vec::new();
    let mut inside = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => inside = e.name().as_ref() == tag.as_bytes(),
            Ok(Event::Text(t)) if inside => {
                if let Ok(text) = t.unescape() {
                    found.push(text.trim().to_owned());
                }
            }
            Ok(Event::End(_)) => inside = false,
            Ok(Event::Eof) | Err(_) => return found,
            Ok(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_nested_elements() {
        let xml = XmlElement::new("category")
            .text_child("name", "Utilities")
            .text_child("priority", 9);
        assert_eq!(
            xml.to_xml_string(),
            "<category><name>Utilities</name><priority>9</priority></category>"
        );
    }

    #[test]
    fn empty_elements_self_close() {
        let xml = XmlElement::new("script").opt_child::<&str>("notes", None);
        assert_eq!(xml.to_xml_string(), "<script><notes/></script>");
    }

    #[test]
    fn text_is_escaped() {
        let xml = XmlElement::with_text("name", "R&D <lab>");
        assert_eq!(xml.to_xml_string(), "<name>R&amp;D &lt;lab&gt;</name>");
    }

    #[test]
    fn document_has_declaration() {
        let doc = XmlElement::with_text("building", "HQ").to_document();
        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(doc.ends_with("<building>HQ</building>"));
    }

    #[test]
    fn find_walks_paths() {
        let xml = XmlElement::new("policy")
            .child(XmlElement::new("general").text_child("name", "Install Office"));
        assert_eq!(xml.find_text("general/name"), Some("Install Office"));
        assert!(xml.find("general/missing").is_none());
    }

    #[test]
    fn parses_id_from_write_response() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?><policy><id>42</id></policy>"#;
        assert_eq!(parse_id(body), Some(42));
    }

    #[test]
    fn collects_repeated_elements() {
        let body = "<commands><command_uuid>a-1</command_uuid><command_uuid>b-2</command_uuid></commands>";
        assert_eq!(collect_text(body, "command_uuid"), vec!["a-1", "b-2"]);
    }

    #[test]
    fn parse_id_ignores_other_elements() {
        assert_eq!(parse_id("<computer_group><name>x</name></computer_group>"), None);
        assert_eq!(parse_id("not xml at all"), None);
    }
}
