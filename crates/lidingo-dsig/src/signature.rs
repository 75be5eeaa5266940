#![forbid(unsafe_code)]

//! Typed projection of a `<ds:Signature>` element.
//!
//! Only the single-Reference shape used by enveloped signatures is
//! modelled. Algorithm URIs are captured as written; checking them is the
//! verifier's job.

use lidingo_core::{ns, Error};
use lidingo_xml::Element;

/// `<ds:Signature>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub signed_info: SignedInfo,
    /// `SignatureValue` text with all whitespace removed.
    pub signature_value: String,
    /// `KeyInfo/X509Data/X509Certificate` text with all whitespace removed.
    pub certificate: Option<String>,
}

/// `<ds:SignedInfo>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInfo {
    pub canonicalization_method: String,
    /// InclusiveNamespaces PrefixList on the CanonicalizationMethod.
    pub inclusive_prefixes: Vec<String>,
    pub signature_method: String,
    pub reference: Reference,
}

/// `<ds:Reference>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub uri: Option<String>,
    pub transforms: Vec<Transform>,
    pub digest_method: String,
    /// `DigestValue` text with all whitespace removed.
    pub digest_value: String,
}

/// `<ds:Transform>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transform {
    pub algorithm: String,
    pub inclusive_prefixes: Vec<String>,
}

impl Signature {
    /// Project a `<ds:Signature>` element.
    ///
    /// An absent or empty `SignatureValue` is [`Error::Unsigned`]; it is
    /// checked before anything else so a stripped signature reports as
    /// such rather than as a structural problem.
    pub fn from_element(sig: &Element) -> Result<Self, Error> {
        let signature_value = sig
            .child(ns::DSIG, ns::node::SIGNATURE_VALUE)
            .map(|v| strip_whitespace(&v.text()))
            .unwrap_or_default();
        if signature_value.is_empty() {
            return Err(Error::Unsigned);
        }

        let signed_info = required_child(sig, ns::node::SIGNED_INFO)?;
        let c14n_method = required_child(signed_info, ns::node::CANONICALIZATION_METHOD)?;
        let sig_method = required_child(signed_info, ns::node::SIGNATURE_METHOD)?;
        let reference = required_child(signed_info, ns::node::REFERENCE)?;

        let certificate = sig
            .child(ns::DSIG, ns::node::KEY_INFO)
            .and_then(|ki| ki.child(ns::DSIG, ns::node::X509_DATA))
            .and_then(|xd| xd.child(ns::DSIG, ns::node::X509_CERTIFICATE))
            .map(|c| strip_whitespace(&c.text()));

        Ok(Self {
            signed_info: SignedInfo {
                canonicalization_method: algorithm_of(c14n_method)?,
                inclusive_prefixes: read_inclusive_prefixes(c14n_method),
                signature_method: algorithm_of(sig_method)?,
                reference: Reference::from_element(reference)?,
            },
            signature_value,
            certificate,
        })
    }
}

impl Reference {
    fn from_element(reference: &Element) -> Result<Self, Error> {
        let transforms = match reference.child(ns::DSIG, ns::node::TRANSFORMS) {
            Some(t) => t
                .children_named(ns::DSIG, ns::node::TRANSFORM)
                .map(|t| {
                    Ok(Transform {
                        algorithm: algorithm_of(t)?,
                        inclusive_prefixes: read_inclusive_prefixes(t),
                    })
                })
                .collect::<Result<Vec<_>, Error>>()?,
            None => Vec::new(),
        };
        let digest_method = required_child(reference, ns::node::DIGEST_METHOD)?;
        let digest_value = required_child(reference, ns::node::DIGEST_VALUE)?;
        Ok(Self {
            uri: reference.attr(ns::attr::URI).map(str::to_owned),
            transforms,
            digest_method: algorithm_of(digest_method)?,
            digest_value: strip_whitespace(&digest_value.text()),
        })
    }
}

fn required_child<'e>(parent: &'e Element, local: &str) -> Result<&'e Element, Error> {
    parent
        .child(ns::DSIG, local)
        .ok_or_else(|| Error::MissingElement(local.into()))
}

fn algorithm_of(el: &Element) -> Result<String, Error> {
    el.attr(ns::attr::ALGORITHM)
        .map(str::to_owned)
        .ok_or_else(|| Error::MissingAttribute(format!("Algorithm on {}", el.name.local)))
}

fn read_inclusive_prefixes(el: &Element) -> Vec<String> {
    el.child(ns::EXC_C14N, ns::node::INCLUSIVE_NAMESPACES)
        .and_then(|inc| inc.attr(ns::attr::PREFIX_LIST))
        .map(lidingo_c14n::parse_prefix_list)
        .unwrap_or_default()
}

pub(crate) fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lidingo_core::algorithm;
    use lidingo_xml::parse_str;

    const SIGNED: &str = include_str!("../static/signed.xml");

    fn signature_of(xml: &str) -> Result<Signature, Error> {
        let doc = parse_str(xml).unwrap();
        let payload = doc.root.child("urn:lidingo:test", "Payload").unwrap();
        Signature::from_element(payload.child(ns::DSIG, ns::node::SIGNATURE).unwrap())
    }

    #[test]
    fn test_projection() {
        let sig = signature_of(SIGNED).unwrap();
        assert_eq!(sig.signed_info.canonicalization_method, algorithm::EXC_C14N);
        assert!(sig.signed_info.inclusive_prefixes.is_empty());
        assert_eq!(sig.signed_info.signature_method, algorithm::RSA_SHA256);
        let reference = &sig.signed_info.reference;
        assert_eq!(reference.uri.as_deref(), Some("#p1"));
        assert_eq!(reference.digest_method, algorithm::SHA256);
        assert_eq!(
            reference.digest_value,
            "DNK1S7v5THSTUQ1vXHaJeSPKqfa3JrJNLlIX6gYQXRY="
        );
        let algorithms: Vec<&str> = reference
            .transforms
            .iter()
            .map(|t| t.algorithm.as_str())
            .collect();
        assert_eq!(
            algorithms,
            vec![algorithm::ENVELOPED_SIGNATURE, algorithm::EXC_C14N]
        );
        assert!(!sig.signature_value.contains('\n'));
        assert!(sig.certificate.is_some_and(|c| !c.contains(char::is_whitespace)));
    }

    #[test]
    fn test_inclusive_namespaces() {
        let xml = SIGNED.replace(
            "<ds:Transform Algorithm=\"http://www.w3.org/2001/10/xml-exc-c14n#\"></ds:Transform>",
            "<ds:Transform Algorithm=\"http://www.w3.org/2001/10/xml-exc-c14n#\">\
             <ec:InclusiveNamespaces xmlns:ec=\"http://www.w3.org/2001/10/xml-exc-c14n#\" \
             PrefixList=\"xs #default\"/></ds:Transform>",
        );
        let sig = signature_of(&xml).unwrap();
        assert_eq!(
            sig.signed_info.reference.transforms[1].inclusive_prefixes,
            vec!["xs", "#default"]
        );
    }

    #[test]
    fn test_empty_signature_value_is_unsigned() {
        let start = SIGNED.find("<ds:SignatureValue>").unwrap();
        let end = SIGNED.find("</ds:SignatureValue>").unwrap();
        let xml = format!(
            "{}<ds:SignatureValue>\n  {}",
            &SIGNED[..start],
            &SIGNED[end..]
        );
        assert_eq!(signature_of(&xml), Err(Error::Unsigned));
    }

    #[test]
    fn test_missing_digest_value() {
        let start = SIGNED.find("<ds:DigestValue>").unwrap();
        let end = SIGNED.find("</ds:Reference>").unwrap();
        let xml = format!("{}{}", &SIGNED[..start], &SIGNED[end..]);
        assert_eq!(
            signature_of(&xml),
            Err(Error::MissingElement("DigestValue".into()))
        );
    }
}
