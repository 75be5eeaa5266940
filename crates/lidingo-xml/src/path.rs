#![forbid(unsafe_code)]

//! Path navigation over parsed trees.
//!
//! A path is a sequence of `(namespace URI, local name)` pairs. The first
//! pair matches the element the search starts from, each following pair
//! one of the children of the previous match. Searches are depth-first in
//! document order and backtrack into sibling subtrees when a partial match
//! dead-ends.

use crate::document::{Attr, Element, Node};
use crate::scope::Scope;

/// One path segment: `(namespace URI, local name)`.
pub type Step<'a> = (&'a str, &'a str);

fn step_matches(step: &Step<'_>, el: &Element) -> bool {
    el.name.is(step.0, step.1)
}

/// First element matching `path`, starting at `root`.
pub fn find_first<'e>(path: &[Step<'_>], root: &'e Element) -> Option<&'e Element> {
    let (head, rest) = path.split_first()?;
    if !step_matches(head, root) {
        return None;
    }
    if rest.is_empty() {
        return Some(root);
    }
    root.child_elements().find_map(|child| find_first(rest, child))
}

/// Like [`find_first`], but the returned element is a copy carrying every
/// namespace binding in scope at the match as explicit `xmlns` attributes,
/// so it can be canonicalized in isolation.
pub fn find_first_hoisting_namespaces(path: &[Step<'_>], root: &Element) -> Option<Element> {
    hoist(path, root, &Scope::new())
}

fn hoist(path: &[Step<'_>], el: &Element, scope: &Scope<'_>) -> Option<Element> {
    let (head, rest) = path.split_first()?;
    if !step_matches(head, el) {
        return None;
    }
    let scope = scope.push(el.namespace_frame());
    if rest.is_empty() {
        return Some(with_namespaces_in_scope(el, &scope));
    }
    el.child_elements().find_map(|child| hoist(rest, child, &scope))
}

fn with_namespaces_in_scope(el: &Element, scope: &Scope<'_>) -> Element {
    let mut attrs: Vec<Attr> = scope
        .in_scope()
        .into_iter()
        .filter(|(prefix, uri)| !(prefix.is_empty() && uri.is_empty()))
        .map(|(prefix, uri)| Attr::namespace_declaration(&prefix, uri))
        .collect();
    attrs.extend(el.data_attrs().cloned());
    Element {
        name: el.name.clone(),
        attrs,
        children: el.children.clone(),
    }
}

/// A copy of `root` without the first descendant matching `path`.
///
/// `path[0]` must match `root` itself. When nothing matches, the copy is
/// identical to `root`.
pub fn remove_subtree(path: &[Step<'_>], root: &Element) -> Element {
    match path.split_first() {
        Some((head, rest)) if step_matches(head, root) && !rest.is_empty() => {
            let mut removed = false;
            strip(rest, root, &mut removed)
        }
        _ => root.clone(),
    }
}

fn strip(path: &[Step<'_>], el: &Element, removed: &mut bool) -> Element {
    let mut children = Vec::with_capacity(el.children.len());
    for child in &el.children {
        let matching = match child {
            Node::Element(c) if !*removed && step_matches(&path[0], c) => Some(c),
            _ => None,
        };
        match matching {
            Some(_) if path.len() == 1 => *removed = true,
            Some(c) => children.push(Node::Element(strip(&path[1..], c, removed))),
            None => children.push(child.clone()),
        }
    }
    Element {
        name: el.name.clone(),
        attrs: el.attrs.clone(),
        children,
    }
}
