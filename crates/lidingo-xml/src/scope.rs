#![forbid(unsafe_code)]

//! Namespace scope stack.
//!
//! Each frame maps a declared prefix ("" for the default namespace) to a
//! URI. A frame is pushed by creating a child `Scope` that borrows its
//! parent, so a frame lives exactly as long as the recursive call that
//! entered the element and is dropped when that call returns. Nothing is
//! mutated in place.

use lidingo_core::ns;
use std::collections::BTreeMap;

/// One frame of namespace declarations.
pub type Frame = BTreeMap<String, String>;

/// An immutable namespace scope: a frame plus its enclosing scope.
#[derive(Debug, Default)]
pub struct Scope<'p> {
    frame: Frame,
    parent: Option<&'p Scope<'p>>,
}

impl<'p> Scope<'p> {
    /// The empty outermost scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter an element: a new scope with `frame` innermost.
    pub fn push(&self, frame: Frame) -> Scope<'_> {
        Scope {
            frame,
            parent: Some(self),
        }
    }

    /// Resolve `prefix`, walking from the innermost frame outward.
    ///
    /// The `xml` prefix is always bound. A default namespace undeclared with
    /// `xmlns=""` resolves to `Some("")`.
    pub fn lookup(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(ns::XML);
        }
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(uri) = scope.frame.get(prefix) {
                return Some(uri);
            }
            current = scope.parent;
        }
        None
    }

    /// Every binding visible here, inner declarations shadowing outer ones.
    pub fn in_scope(&self) -> Frame {
        let mut frames = Vec::new();
        let mut current = Some(self);
        while let Some(scope) = current {
            frames.push(&scope.frame);
            current = scope.parent;
        }
        let mut result = Frame::new();
        for frame in frames.into_iter().rev() {
            for (prefix, uri) in frame {
                result.insert(prefix.clone(), uri.clone());
            }
        }
        result
    }
}
