#![forbid(unsafe_code)]

//! Character references in canonical output.
//!
//! Canonical XML writes `&`, `<`, `>` and CR in character data as
//! references. In attribute values it writes `&`, `<`, `"` and the three
//! whitespace characters an XML processor would otherwise normalize away
//! (TAB, LF, CR), while `>` stays literal.

use std::borrow::Cow;

/// Where escaped content lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Text,
    Attribute,
}

fn reference(ch: char, context: Context) -> Option<&'static str> {
    Some(match (ch, context) {
        ('&', _) => "&amp;",
        ('<', _) => "&lt;",
        ('\r', _) => "&#xD;",
        ('>', Context::Text) => "&gt;",
        ('"', Context::Attribute) => "&quot;",
        ('\t', Context::Attribute) => "&#x9;",
        ('\n', Context::Attribute) => "&#xA;",
        _ => return None,
    })
}

/// Escape `s` for `context`, borrowing when nothing needs replacing.
pub fn escape(s: &str, context: Context) -> Cow<'_, str> {
    let Some(first) = s.find(|c| reference(c, context).is_some()) else {
        return Cow::Borrowed(s);
    };
    let mut out = String::with_capacity(s.len() + 8);
    out.push_str(&s[..first]);
    for ch in s[first..].chars() {
        match reference(ch, context) {
            Some(r) => out.push_str(r),
            None => out.push(ch),
        }
    }
    Cow::Owned(out)
}

pub fn escape_text(s: &str) -> Cow<'_, str> {
    escape(s, Context::Text)
}

pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape(s, Context::Attribute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert!(matches!(escape_text("hello"), Cow::Borrowed("hello")));
        assert_eq!(escape_text("a&b<c>d"), "a&amp;b&lt;c&gt;d");
        assert_eq!(escape_text("line\rend"), "line&#xD;end");
        assert_eq!(escape_text("'\"\t\n"), "'\"\t\n");
    }

    #[test]
    fn test_escape_attr() {
        assert!(matches!(escape_attr("hello"), Cow::Borrowed(_)));
        assert_eq!(escape_attr("a&b\"c>'"), "a&amp;b&quot;c>'");
        assert_eq!(escape_attr("a\tb\nc\rd"), "a&#x9;b&#xA;c&#xD;d");
    }
}
