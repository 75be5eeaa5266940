#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 (exc-C14N), without comments.
//!
//! Algorithm URI: `http://www.w3.org/2001/10/xml-exc-c14n#`
//!
//! Only "visibly utilized" namespace declarations are output. A prefix is
//! visibly utilized by an element if:
//! 1. it is the prefix of the element's tag name (the default namespace for
//!    unprefixed elements), OR
//! 2. it is the prefix of one of the element's prefixed attributes, OR
//! 3. it appears in the InclusiveNamespaces PrefixList (`#default` naming
//!    the default namespace).
//!
//! The walk carries two scopes: `known` holds every declaration visible at
//! the current element, `rendered` holds what output ancestors have already
//! emitted. A visibly utilized prefix is declared in the output only when
//! its known value differs from its rendered value.

use crate::escape;
use crate::render::{self, Attr, NsDecl, TagAttr};
use lidingo_xml::scope::{Frame, Scope};
use lidingo_xml::{Element, Node};
use std::collections::BTreeSet;

/// Canonicalize a node (and its subtree).
///
/// Namespace context the node relies on from outside the subtree must be
/// present on the node itself, e.g. via
/// [`find_first_hoisting_namespaces`](lidingo_xml::path::find_first_hoisting_namespaces).
pub fn canonicalize(node: &Node, inclusive_prefixes: &[String]) -> Vec<u8> {
    let ctx = ExcC14nContext::new(inclusive_prefixes);
    let mut output = Vec::new();
    ctx.process_node(node, &Scope::new(), &Scope::new(), &mut output);
    output
}

/// Canonicalize an element (and its subtree).
pub fn canonicalize_element(el: &Element, inclusive_prefixes: &[String]) -> Vec<u8> {
    let ctx = ExcC14nContext::new(inclusive_prefixes);
    let mut output = Vec::new();
    ctx.process_element(el, &Scope::new(), &Scope::new(), &mut output);
    output
}

struct ExcC14nContext {
    inclusive_prefixes: BTreeSet<String>,
}

impl ExcC14nContext {
    fn new(inclusive_prefixes: &[String]) -> Self {
        let inclusive_prefixes = inclusive_prefixes
            .iter()
            .map(|p| {
                if p == "#default" {
                    String::new()
                } else {
                    p.clone()
                }
            })
            .collect();
        Self { inclusive_prefixes }
    }

    fn process_node(
        &self,
        node: &Node,
        known: &Scope<'_>,
        rendered: &Scope<'_>,
        output: &mut Vec<u8>,
    ) {
        match node {
            Node::Element(el) => self.process_element(el, known, rendered, output),
            Node::Text(text) => output.extend_from_slice(escape::escape_text(text).as_bytes()),
        }
    }

    fn process_element(
        &self,
        el: &Element,
        known: &Scope<'_>,
        rendered: &Scope<'_>,
        output: &mut Vec<u8>,
    ) {
        let known = known.push(el.namespace_frame());

        // Determine which namespace prefixes are "visibly utilized"
        let mut utilized: BTreeSet<&str> = BTreeSet::new();
        utilized.insert(&el.name.qualifier);
        for attr in el.data_attrs() {
            if !attr.name.qualifier.is_empty() {
                utilized.insert(&attr.name.qualifier);
            }
        }
        for prefix in &self.inclusive_prefixes {
            utilized.insert(prefix);
        }

        let mut emitted = Frame::new();
        let mut tag_attrs: Vec<TagAttr> = Vec::new();
        for prefix in utilized {
            if prefix == "xml" {
                continue;
            }
            let uri = known.lookup(prefix).unwrap_or("");
            let previously_rendered = rendered.lookup(prefix).unwrap_or("");
            if uri == previously_rendered {
                continue;
            }
            // An undeclared prefix can only come from the PrefixList.
            // For the default namespace this renders `xmlns=""`.
            if uri.is_empty() && !prefix.is_empty() {
                continue;
            }
            emitted.insert(prefix.to_owned(), uri.to_owned());
            tag_attrs.push(TagAttr::Namespace(NsDecl {
                prefix: prefix.to_owned(),
                uri: uri.to_owned(),
            }));
        }
        tag_attrs.extend(el.data_attrs().map(|a| TagAttr::Data(Attr::from_xml(a))));

        let elem_name = el.name.qualified();
        output.push(b'<');
        output.extend_from_slice(elem_name.as_bytes());
        for attr in render::order(tag_attrs) {
            output.extend_from_slice(attr.render().as_bytes());
        }
        output.push(b'>');

        let rendered = rendered.push(emitted);
        for child in &el.children {
            self.process_node(child, &known, &rendered, output);
        }

        output.extend_from_slice(b"</");
        output.extend_from_slice(elem_name.as_bytes());
        output.push(b'>');
    }
}
