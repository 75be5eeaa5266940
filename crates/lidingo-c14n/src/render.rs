#![forbid(unsafe_code)]

//! Start-tag attribute rendering and ordering.
//!
//! Canonical order within a start tag:
//! 1. the default namespace declaration, if rendered;
//! 2. the other namespace declarations, by prefix;
//! 3. data attributes, by `(namespace URI, local name)` with the empty URI
//!    sorting first.
//!
//! `(URI, local name)` pairs are unique per element, so the order is total.

use crate::escape;
use std::cmp::Ordering;

/// A namespace declaration to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsDecl {
    /// The prefix ("" for default namespace).
    pub prefix: String,
    /// The namespace URI.
    pub uri: String,
}

impl NsDecl {
    /// Render this namespace declaration to a string.
    pub fn render(&self) -> String {
        if self.prefix.is_empty() {
            format!(" xmlns=\"{}\"", escape::escape_attr(&self.uri))
        } else {
            format!(
                " xmlns:{}=\"{}\"",
                self.prefix,
                escape::escape_attr(&self.uri)
            )
        }
    }
}

impl Ord for NsDecl {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.prefix.is_empty(), other.prefix.is_empty()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self.prefix.cmp(&other.prefix),
        }
    }
}

impl PartialOrd for NsDecl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A data attribute to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// The namespace URI of the attribute ("" for no namespace).
    pub ns_uri: String,
    /// The local name.
    pub local_name: String,
    /// The qualified name (prefix:local or just local).
    pub qualified_name: String,
    /// The attribute value.
    pub value: String,
}

impl Attr {
    pub fn from_xml(attr: &lidingo_xml::Attr) -> Self {
        Self {
            ns_uri: attr.name.uri.clone(),
            local_name: attr.name.local.clone(),
            qualified_name: attr.name.qualified(),
            value: attr.value.clone(),
        }
    }

    /// Render this attribute to a string.
    pub fn render(&self) -> String {
        format!(
            " {}=\"{}\"",
            self.qualified_name,
            escape::escape_attr(&self.value)
        )
    }
}

impl Ord for Attr {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ns_uri
            .cmp(&other.ns_uri)
            .then_with(|| self.local_name.cmp(&other.local_name))
    }
}

impl PartialOrd for Attr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Anything that appears in a canonical start tag after the element name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagAttr {
    Namespace(NsDecl),
    Data(Attr),
}

impl TagAttr {
    pub fn render(&self) -> String {
        match self {
            TagAttr::Namespace(decl) => decl.render(),
            TagAttr::Data(attr) => attr.render(),
        }
    }
}

impl Ord for TagAttr {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (TagAttr::Namespace(a), TagAttr::Namespace(b)) => a.cmp(b),
            (TagAttr::Namespace(_), TagAttr::Data(_)) => Ordering::Less,
            (TagAttr::Data(_), TagAttr::Namespace(_)) => Ordering::Greater,
            (TagAttr::Data(a), TagAttr::Data(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for TagAttr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Put one element's rendered declarations and attributes in canonical order.
pub fn order(mut attrs: Vec<TagAttr>) -> Vec<TagAttr> {
    attrs.sort();
    attrs
}
