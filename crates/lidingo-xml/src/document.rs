#![forbid(unsafe_code)]

//! Owned XML tree produced by the subset parser.
//!
//! The tree is immutable once built: every consumer (canonicalizer, path
//! navigator, SAML projections) borrows it, and tree "edits" such as
//! removing the `<Signature>` subtree produce a new tree.

use std::collections::BTreeMap;

/// A qualified name with its resolved namespace URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    /// Resolved namespace URI ("" when the name is in no namespace).
    pub uri: String,
    /// Prefix as written in the source ("" when unprefixed).
    pub qualifier: String,
    /// Local part of the name.
    pub local: String,
}

impl Name {
    pub fn new(uri: &str, qualifier: &str, local: &str) -> Self {
        Self {
            uri: uri.to_owned(),
            qualifier: qualifier.to_owned(),
            local: local.to_owned(),
        }
    }

    /// Split a raw `prefix:local` name. The URI is left empty; it is filled
    /// in by namespace resolution.
    pub fn split(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((qualifier, local)) => Self::new("", qualifier, local),
            None => Self::new("", "", raw),
        }
    }

    /// The name as written: `prefix:local` or `local`.
    pub fn qualified(&self) -> String {
        if self.qualifier.is_empty() {
            self.local.clone()
        } else {
            format!("{}:{}", self.qualifier, self.local)
        }
    }

    /// Whether this attribute name is an `xmlns` / `xmlns:prefix` declaration.
    pub fn is_namespace_declaration(&self) -> bool {
        (self.qualifier.is_empty() && self.local == "xmlns") || self.qualifier == "xmlns"
    }

    /// For a namespace declaration, the prefix it declares ("" for the
    /// default namespace).
    pub fn declared_prefix(&self) -> Option<&str> {
        if self.qualifier.is_empty() && self.local == "xmlns" {
            Some("")
        } else if self.qualifier == "xmlns" {
            Some(&self.local)
        } else {
            None
        }
    }

    /// Match against a `(namespace URI, local name)` pair.
    pub fn is(&self, uri: &str, local: &str) -> bool {
        self.uri == uri && self.local == local
    }
}

/// An attribute with its entity-decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: Name,
    pub value: String,
}

impl Attr {
    pub fn new(name: Name, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    /// Build an `xmlns` (empty prefix) or `xmlns:prefix` declaration.
    pub fn namespace_declaration(prefix: &str, uri: impl Into<String>) -> Self {
        let name = if prefix.is_empty() {
            Name::new("", "", "xmlns")
        } else {
            Name::new("", "xmlns", prefix)
        };
        Self::new(name, uri)
    }
}

/// An XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: Name,
    /// Attributes in document order, namespace declarations included.
    pub attrs: Vec<Attr>,
    pub children: Vec<Node>,
}

/// A node in the tree: exactly an element or a run of character data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

/// A parsed document with a single root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

impl Element {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: append an attribute.
    pub fn with_attr(mut self, name: Name, value: impl Into<String>) -> Self {
        self.attrs.push(Attr::new(name, value));
        self
    }

    /// Builder: append a namespace declaration.
    pub fn with_namespace(mut self, prefix: &str, uri: &str) -> Self {
        self.attrs.push(Attr::namespace_declaration(prefix, uri));
        self
    }

    /// Builder: append a child node.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Builder: append a text child.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Value of the un-namespaced attribute `local`.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.uri.is_empty() && !a.name.is_namespace_declaration() && a.name.local == local)
            .map(|a| a.value.as_str())
    }

    /// Namespace declarations made directly on this element, as a scope frame.
    pub fn namespace_frame(&self) -> BTreeMap<String, String> {
        self.attrs
            .iter()
            .filter_map(|a| {
                a.name
                    .declared_prefix()
                    .map(|prefix| (prefix.to_owned(), a.value.clone()))
            })
            .collect()
    }

    /// Data (non-declaration) attributes.
    pub fn data_attrs(&self) -> impl Iterator<Item = &Attr> {
        self.attrs.iter().filter(|a| !a.name.is_namespace_declaration())
    }

    /// Child elements, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First child element named `(uri, local)`.
    pub fn child(&self, uri: &str, local: &str) -> Option<&Element> {
        self.child_elements().find(|c| c.name.is(uri, local))
    }

    /// All child elements named `(uri, local)`.
    pub fn children_named<'a>(
        &'a self,
        uri: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.child_elements().filter(move |c| c.name.is(uri, local))
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        self.children.iter().filter_map(Node::as_text).collect()
    }
}
