#![forbid(unsafe_code)]

//! Plain (non-canonical) XML serialization.
//!
//! Attributes are written in stored order, namespace declarations
//! included, and empty elements are self-closing. The output is accepted
//! by the subset parser.

use crate::document::{Element, Node};

/// An XML writer accumulating into a string buffer.
pub struct XmlWriter {
    buf: String,
}

impl XmlWriter {
    /// Create a new XML writer.
    pub fn new() -> Self {
        Self { buf: String::new() }
    }

    /// Write the XML declaration.
    pub fn write_declaration(&mut self) {
        self.buf
            .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
    }

    /// Write a node and its descendants.
    pub fn write_node(&mut self, node: &Node) {
        match node {
            Node::Element(el) => self.write_element(el),
            Node::Text(text) => self.write_text(text),
        }
    }

    /// Write an element and its descendants.
    pub fn write_element(&mut self, el: &Element) {
        let name = el.name.qualified();
        self.buf.push('<');
        self.buf.push_str(&name);
        for attr in &el.attrs {
            self.buf.push(' ');
            self.buf.push_str(&attr.name.qualified());
            self.buf.push_str("=\"");
            escape_into(&mut self.buf, &attr.value, true);
            self.buf.push('"');
        }
        if el.children.is_empty() {
            self.buf.push_str("/>");
            return;
        }
        self.buf.push('>');
        for child in &el.children {
            self.write_node(child);
        }
        self.buf.push_str("</");
        self.buf.push_str(&name);
        self.buf.push('>');
    }

    /// Write escaped character data.
    pub fn write_text(&mut self, text: &str) {
        escape_into(&mut self.buf, text, false);
    }

    /// Finish writing and return the XML as a string.
    pub fn into_string(self) -> String {
        self.buf
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize an element to a string without an XML declaration.
pub fn to_string(el: &Element) -> String {
    let mut writer = XmlWriter::new();
    writer.write_element(el);
    writer.into_string()
}

fn escape_into(out: &mut String, s: &str, attr: bool) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' if !attr => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            '\t' if attr => out.push_str("&#x9;"),
            '\n' if attr => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Name;
    use crate::parser::parse_str;

    #[test]
    fn test_write_built_element() {
        let el = Element::new(Name::new("urn:p", "", "Req"))
            .with_namespace("", "urn:p")
            .with_attr(Name::split("ID"), "a\"b")
            .with_child(Element::new(Name::new("urn:p", "", "Empty")))
            .with_text("x < y & z");
        assert_eq!(
            to_string(&el),
            "<Req xmlns=\"urn:p\" ID=\"a&quot;b\"><Empty/>x &lt; y &amp; z</Req>"
        );
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let xml = "<?xml version=\"1.0\"?>\n<r:a xmlns:r=\"urn:r\" v=\"&lt;&quot;&#9;\">\n  \
                   <r:b x=\"1\" y=\"multi&#xA;line&#13;\">t&amp;&gt;&#xD;</r:b><c/></r:a>";
        let first = parse_str(xml).unwrap();
        let b = first.root.child("urn:r", "b").unwrap();
        assert_eq!(b.attr("y"), Some("multi\nline\r"));
        assert_eq!(b.text(), "t&>\r");
        let mut writer = XmlWriter::new();
        writer.write_declaration();
        writer.write_element(&first.root);
        let second = parse_str(&writer.into_string()).unwrap();
        assert_eq!(first, second);
    }
}
