#![forbid(unsafe_code)]

//! XML document model for the Lidingo SAML service provider core.
//!
//! Provides a parser for the restricted XML grammar SAML producers use,
//! the namespace scope stack, path navigation for locating and excising
//! subtrees, and a plain serializer.

pub mod document;
pub mod parser;
pub mod path;
pub mod scope;
pub mod writer;

pub use document::{Attr, Document, Element, Name, Node};
pub use parser::{parse, parse_str};
pub use scope::Scope;
