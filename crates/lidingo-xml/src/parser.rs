#![forbid(unsafe_code)]

//! Parser for the restricted XML grammar used by SAML documents.
//!
//! Accepted input is an optional `<?...?>` declaration followed by exactly
//! one root element. Elements carry double-quoted attributes and contain
//! elements and character data. Comments, CDATA sections, DTDs, processing
//! instructions after the prolog and single-quoted attribute values are
//! rejected.
//!
//! Line endings are normalized to `\n` and literal whitespace in attribute
//! values to spaces, as an XML processor does before canonicalization sees
//! the data. Character references are decoded after that, so `&#13;`
//! survives as a carriage return.
//!
//! Parsing happens in two passes. The first builds a raw tree of
//! unresolved names while checking tag structure and decoding entities.
//! The second walks that tree top-down with a [`Scope`] and resolves every
//! element and attribute name to its namespace URI.

use crate::document::{Attr, Document, Element, Name, Node};
use crate::scope::Scope;
use lidingo_core::{Error, Result};

/// Deepest element nesting accepted. SAML documents stay far below this.
pub const MAX_DEPTH: usize = 256;

/// Parse a complete document.
pub fn parse(input: &[u8]) -> Result<Document> {
    let text = std::str::from_utf8(input)
        .map_err(|e| Error::malformed(e.valid_up_to(), "input is not valid UTF-8"))?;
    let raw = Parser::new(text).document()?;
    let root = resolve(&raw, &Scope::new())?;
    Ok(Document { root })
}

/// Parse a document given as a string.
pub fn parse_str(input: &str) -> Result<Document> {
    parse(input.as_bytes())
}

// ── First pass: structure ────────────────────────────────────────────

struct RawElement {
    name: String,
    offset: usize,
    attrs: Vec<(String, String)>,
    children: Vec<RawNode>,
}

enum RawNode {
    Element(RawElement),
    Text(String),
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::malformed(self.pos, message)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn expect(&mut self, s: &str) -> Result<()> {
        if self.starts_with(s) {
            self.pos += s.len();
            Ok(())
        } else {
            Err(self.error(format!("expected `{s}`")))
        }
    }

    /// Skip whitespace, returning whether any was skipped.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn document(mut self) -> Result<RawElement> {
        if let Some(bom) = self.rest().strip_prefix('\u{feff}') {
            self.pos = self.src.len() - bom.len();
        }
        self.skip_ws();
        if self.starts_with("<?") {
            self.declaration()?;
            self.skip_ws();
        }
        if self.starts_with("<!") {
            return Err(self.error("DTDs and comments are not supported"));
        }
        let root = self.element()?;
        self.skip_ws();
        if self.pos != self.src.len() {
            return Err(self.error("unexpected content after the root element"));
        }
        Ok(root)
    }

    /// `<?name attr="value"* ?>`; the attributes are checked and dropped.
    fn declaration(&mut self) -> Result<()> {
        self.expect("<?")?;
        self.name()?;
        loop {
            let had_ws = self.skip_ws();
            if self.starts_with("?>") {
                self.pos += 2;
                return Ok(());
            }
            if !had_ws {
                return Err(self.error("expected whitespace before attribute"));
            }
            self.attribute()?;
        }
    }

    fn name(&mut self) -> Result<&'a str> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == b'_' => self.pos += 1,
            _ => return Err(self.error("expected a name")),
        }
        while matches!(
            self.peek(),
            Some(c) if c.is_ascii_alphanumeric() || matches!(c, b':' | b'_' | b'-' | b'.')
        ) {
            self.pos += 1;
        }
        let name = &self.src[start..self.pos];
        if let Some((_, local)) = name.split_once(':') {
            if local.is_empty() || local.contains(':') {
                return Err(Error::malformed(start, format!("invalid qualified name `{name}`")));
            }
        }
        Ok(name)
    }

    fn attribute(&mut self) -> Result<(String, String)> {
        let name = self.name()?.to_owned();
        self.skip_ws();
        self.expect("=")?;
        self.skip_ws();
        if self.peek() == Some(b'\'') {
            return Err(self.error("single-quoted attribute values are not supported"));
        }
        self.expect("\"")?;
        let start = self.pos;
        let len = self
            .rest()
            .find('"')
            .ok_or_else(|| self.error("unterminated attribute value"))?;
        let raw = &self.src[start..start + len];
        if let Some(i) = raw.find('<') {
            return Err(Error::malformed(start + i, "`<` in attribute value"));
        }
        self.pos += len + 1;
        Ok((name, decode(raw, start, true)?))
    }

    fn element(&mut self) -> Result<RawElement> {
        let offset = self.pos;
        if self.depth >= MAX_DEPTH {
            return Err(self.error("elements nested too deeply"));
        }
        self.expect("<")?;
        let name = self.name()?.to_owned();
        let mut attrs: Vec<(String, String)> = Vec::new();

        loop {
            let had_ws = self.skip_ws();
            if self.starts_with("/>") {
                self.pos += 2;
                return Ok(RawElement {
                    name,
                    offset,
                    attrs,
                    children: Vec::new(),
                });
            }
            if self.starts_with(">") {
                self.pos += 1;
                break;
            }
            if !had_ws {
                return Err(self.error(format!("malformed start tag `{name}`")));
            }
            let attr_offset = self.pos;
            let attr = self.attribute()?;
            if attrs.iter().any(|(n, _)| *n == attr.0) {
                return Err(Error::malformed(
                    attr_offset,
                    format!("duplicate attribute `{}`", attr.0),
                ));
            }
            attrs.push(attr);
        }

        let mut children = Vec::new();
        loop {
            if self.starts_with("</") {
                self.pos += 2;
                let end_name = self.name()?;
                if end_name != name {
                    return Err(self.error(format!(
                        "end tag `{end_name}` does not match start tag `{name}`"
                    )));
                }
                self.skip_ws();
                self.expect(">")?;
                break;
            }
            if self.starts_with("<!") || self.starts_with("<?") {
                return Err(self.error(
                    "comments, CDATA sections and processing instructions are not supported",
                ));
            }
            if self.starts_with("<") {
                self.depth += 1;
                let child = self.element()?;
                self.depth -= 1;
                children.push(RawNode::Element(child));
                continue;
            }
            if self.pos == self.src.len() {
                return Err(self.error(format!("missing end tag for `{name}`")));
            }
            let start = self.pos;
            let len = self.rest().find('<').unwrap_or(self.rest().len());
            self.pos += len;
            let text = decode(&self.src[start..self.pos], start, false)?;
            children.push(RawNode::Text(text));
        }

        Ok(RawElement {
            name,
            offset,
            attrs,
            children,
        })
    }
}

/// Decode the predefined entities and numeric character references,
/// normalizing line endings (and, in attribute values, literal whitespace).
///
/// `offset` is the position of `raw` in the input, for error reporting.
fn decode(raw: &str, offset: usize, attribute: bool) -> Result<String> {
    let special = |c: char| c == '&' || c == '\r' || (attribute && (c == '\n' || c == '\t'));
    if !raw.contains(special) {
        return Ok(raw.to_owned());
    }
    let mut out = String::with_capacity(raw.len());
    let mut pos = 0;
    while let Some(found) = raw[pos..].find(special) {
        let at = pos + found;
        out.push_str(&raw[pos..at]);
        match raw.as_bytes()[at] {
            b'&' => {
                let after = &raw[at + 1..];
                let end = after
                    .find(';')
                    .ok_or_else(|| Error::malformed(offset + at, "unterminated entity reference"))?;
                out.push(reference(&after[..end], offset + at)?);
                pos = at + end + 2;
            }
            b'\r' => {
                out.push(if attribute { ' ' } else { '\n' });
                pos = at + 1;
                if raw[pos..].starts_with('\n') {
                    pos += 1;
                }
            }
            _ => {
                out.push(' ');
                pos = at + 1;
            }
        }
    }
    out.push_str(&raw[pos..]);
    Ok(out)
}

fn reference(entity: &str, at: usize) -> Result<char> {
    let ch = match entity {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "apos" => '\'',
        "quot" => '"',
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok()
            } else {
                None
            };
            code.and_then(char::from_u32).ok_or_else(|| {
                Error::malformed(at, format!("invalid entity reference `&{entity};`"))
            })?
        }
    };
    Ok(ch)
}

// ── Second pass: namespaces ──────────────────────────────────────────

fn resolve(raw: &RawElement, scope: &Scope<'_>) -> Result<Element> {
    let mut frame = crate::scope::Frame::new();
    for (name, value) in &raw.attrs {
        if let Some(prefix) = Name::split(name).declared_prefix() {
            frame.insert(prefix.to_owned(), value.clone());
        }
    }
    let scope = scope.push(frame);

    let mut name = Name::split(&raw.name);
    name.uri = if name.qualifier.is_empty() {
        scope.lookup("").unwrap_or("").to_owned()
    } else {
        resolve_prefix(&scope, &name.qualifier, raw.offset)?
    };

    let mut attrs = Vec::with_capacity(raw.attrs.len());
    for (raw_name, value) in &raw.attrs {
        let mut attr_name = Name::split(raw_name);
        // Unprefixed attributes are in no namespace, whatever the default is.
        if !attr_name.is_namespace_declaration() && !attr_name.qualifier.is_empty() {
            attr_name.uri = resolve_prefix(&scope, &attr_name.qualifier, raw.offset)?;
        }
        attrs.push(Attr::new(attr_name, value.clone()));
    }

    let mut children = Vec::with_capacity(raw.children.len());
    for child in &raw.children {
        children.push(match child {
            RawNode::Element(el) => Node::Element(resolve(el, &scope)?),
            RawNode::Text(text) => Node::Text(text.clone()),
        });
    }

    Ok(Element {
        name,
        attrs,
        children,
    })
}

fn resolve_prefix(scope: &Scope<'_>, prefix: &str, offset: usize) -> Result<String> {
    match scope.lookup(prefix) {
        Some(uri) if !uri.is_empty() => Ok(uri.to_owned()),
        _ => Err(Error::malformed(
            offset,
            format!("undeclared namespace prefix `{prefix}`"),
        )),
    }
}
