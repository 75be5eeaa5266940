#![forbid(unsafe_code)]

//! XML Canonicalization (C14N) for the Lidingo SAML service provider core.
//!
//! Implements Exclusive Canonical XML 1.0 without comments, the only
//! variant SAML signatures are accepted with. Comments and processing
//! instructions never reach the tree, so there is nothing to drop.

pub mod escape;
pub mod exclusive;
pub mod render;

use lidingo_core::{algorithm, Error};

pub use exclusive::{canonicalize, canonicalize_element};

/// Whether `uri` names the canonicalization algorithm implemented here.
pub fn is_supported(uri: &str) -> bool {
    uri == algorithm::EXC_C14N
}

/// Split an InclusiveNamespaces `PrefixList` attribute into prefixes.
pub fn parse_prefix_list(list: &str) -> Vec<String> {
    list.split_whitespace().map(str::to_owned).collect()
}

/// Convenience: parse and canonicalize an XML document.
pub fn canonicalize_str(xml: &str, inclusive_prefixes: &[String]) -> Result<Vec<u8>, Error> {
    let doc = lidingo_xml::parse_str(xml)?;
    Ok(canonicalize_doc(&doc, inclusive_prefixes))
}

/// Convenience: canonicalize a pre-parsed document.
pub fn canonicalize_doc(doc: &lidingo_xml::Document, inclusive_prefixes: &[String]) -> Vec<u8> {
    exclusive::canonicalize_element(&doc.root, inclusive_prefixes)
}
