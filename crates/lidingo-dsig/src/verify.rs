#![forbid(unsafe_code)]

//! Enveloped XML-DSig signature verification.
//!
//! Processing order:
//! 1. Locate the signed element, carrying its in-scope namespaces, and
//!    project its `<Signature>` child
//! 2. Check algorithms: exc-C14N, SHA-256, RSA-SHA256 and the enveloped
//!    signature transform are the only ones accepted
//! 3. Check the Reference URI points at the signed element's `ID`
//! 4. Canonicalize the element without its `<Signature>`, digest, compare
//! 5. Canonicalize `<SignedInfo>`
//! 6. Extract the RSA key from the certificate and verify `SignatureValue`

use crate::signature::Signature;
use base64::Engine;
use lidingo_core::{algorithm, ns, Error};
use lidingo_crypto::{digest, key, sign};
use lidingo_xml::path::{self, Step};
use lidingo_xml::{Document, Element};
use tracing::{debug, warn};

/// Verify the enveloped signature on the element at `target`.
///
/// `certificate_der` is the signer's X.509 certificate; any certificate in
/// the signature's own `KeyInfo` is ignored. `target` is a path from the
/// document root to the signed element.
pub fn verify_enveloped(
    certificate_der: &[u8],
    doc: &Document,
    target: &[Step<'_>],
) -> Result<(), Error> {
    let (target_uri, target_local) = *target
        .last()
        .ok_or_else(|| Error::MissingElement("signature target".into()))?;
    let signed = path::find_first_hoisting_namespaces(target, &doc.root)
        .ok_or_else(|| Error::MissingElement(target_local.into()))?;
    let sig_el = signed
        .child(ns::DSIG, ns::node::SIGNATURE)
        .ok_or(Error::Unsigned)?;
    let sig = Signature::from_element(sig_el)?;

    check_algorithms(&sig)?;
    check_reference_uri(&sig, &signed)?;

    // Digest of the element with its signature removed
    let reference = &sig.signed_info.reference;
    let body = path::remove_subtree(
        &[(target_uri, target_local), (ns::DSIG, ns::node::SIGNATURE)],
        &signed,
    );
    let prefixes = reference
        .transforms
        .iter()
        .find(|t| t.algorithm == algorithm::EXC_C14N)
        .map(|t| t.inclusive_prefixes.as_slice())
        .unwrap_or_default();
    let canonical_body = lidingo_c14n::canonicalize_element(&body, prefixes);
    debug!(
        element = target_local,
        bytes = canonical_body.len(),
        "canonicalized signed element"
    );
    let computed = digest::digest(&reference.digest_method, &canonical_body)?;
    let expected = decode_base64("DigestValue", &reference.digest_value)?;
    if computed != expected {
        warn!(element = target_local, "digest mismatch");
        return Err(Error::BadDigest);
    }

    // Canonical SignedInfo, with the namespaces it relies on from above
    let signed_info = path::find_first_hoisting_namespaces(
        &[
            (target_uri, target_local),
            (ns::DSIG, ns::node::SIGNATURE),
            (ns::DSIG, ns::node::SIGNED_INFO),
        ],
        &signed,
    )
    .ok_or_else(|| Error::MissingElement(ns::node::SIGNED_INFO.into()))?;
    let canonical_signed_info =
        lidingo_c14n::canonicalize_element(&signed_info, &sig.signed_info.inclusive_prefixes);
    debug!(
        bytes = canonical_signed_info.len(),
        "canonicalized SignedInfo"
    );

    let public_key = key::rsa_public_key_from_cert(certificate_der)?;
    let signature_value = decode_base64("SignatureValue", &sig.signature_value)?;
    sign::verify(
        &sig.signed_info.signature_method,
        &public_key,
        &canonical_signed_info,
        &signature_value,
    )
    .map_err(|e| {
        warn!(element = target_local, error = %e, "signature value does not verify");
        e
    })
}

/// Parse `xml` and verify the enveloped signature on the element at `target`.
pub fn verify_enveloped_bytes(
    certificate_der: &[u8],
    xml: &[u8],
    target: &[Step<'_>],
) -> Result<(), Error> {
    let doc = lidingo_xml::parse(xml)?;
    verify_enveloped(certificate_der, &doc, target)
}

fn check_algorithms(sig: &Signature) -> Result<(), Error> {
    let si = &sig.signed_info;
    if !lidingo_c14n::is_supported(&si.canonicalization_method) {
        return Err(Error::UnsupportedAlgorithm(format!(
            "C14N: {}",
            si.canonicalization_method
        )));
    }
    if si.signature_method != algorithm::RSA_SHA256 {
        return Err(Error::UnsupportedAlgorithm(format!(
            "signature algorithm: {}",
            si.signature_method
        )));
    }
    if si.reference.digest_method != algorithm::SHA256 {
        return Err(Error::UnsupportedAlgorithm(format!(
            "digest algorithm: {}",
            si.reference.digest_method
        )));
    }
    for transform in &si.reference.transforms {
        match transform.algorithm.as_str() {
            algorithm::ENVELOPED_SIGNATURE | algorithm::EXC_C14N => {}
            other => {
                return Err(Error::UnsupportedAlgorithm(format!("transform: {other}")));
            }
        }
    }
    Ok(())
}

fn check_reference_uri(sig: &Signature, signed: &Element) -> Result<(), Error> {
    let Some(uri) = sig.signed_info.reference.uri.as_deref() else {
        return Ok(());
    };
    let expected = format!("#{}", signed.attr(ns::attr::ID).unwrap_or_default());
    if uri != expected {
        return Err(Error::ReferenceMismatch {
            reference: uri.to_owned(),
            expected,
        });
    }
    Ok(())
}

fn decode_base64(what: &str, value: &str) -> Result<Vec<u8>, Error> {
    base64::engine::general_purpose::STANDARD
        .decode(value)
        .map_err(|e| Error::Base64(format!("{what}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lidingo_xml::parse_str;

    const SIGNED: &str = include_str!("../static/signed.xml");
    const PAYLOAD: [Step<'static>; 2] = [("urn:lidingo:test", "Envelope"), ("urn:lidingo:test", "Payload")];

    fn cert(b64: &str) -> Vec<u8> {
        base64::engine::general_purpose::STANDARD
            .decode(b64.trim())
            .unwrap()
    }

    fn idp_cert() -> Vec<u8> {
        cert(include_str!("../static/idp-cert.b64"))
    }

    fn check(xml: &str) -> Result<(), Error> {
        verify_enveloped_bytes(&idp_cert(), xml.as_bytes(), &PAYLOAD)
    }

    #[test]
    fn test_valid_signature() {
        check(SIGNED).unwrap();
    }

    #[test]
    fn test_canonical_forms() {
        let doc = parse_str(SIGNED).unwrap();
        let signed = path::find_first_hoisting_namespaces(&PAYLOAD, &doc.root).unwrap();
        let body = path::remove_subtree(
            &[PAYLOAD[1], (ns::DSIG, ns::node::SIGNATURE)],
            &signed,
        );
        assert_eq!(
            String::from_utf8(lidingo_c14n::canonicalize_element(&body, &[])).unwrap(),
            include_str!("../static/payload.c14n")
        );

        let signed_info = path::find_first_hoisting_namespaces(
            &[
                PAYLOAD[1],
                (ns::DSIG, ns::node::SIGNATURE),
                (ns::DSIG, ns::node::SIGNED_INFO),
            ],
            &signed,
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(lidingo_c14n::canonicalize_element(&signed_info, &[])).unwrap(),
            include_str!("../static/signed_info.c14n")
        );
    }

    #[test]
    fn test_insignificant_serialization_changes_still_verify() {
        // Attribute order, self-closing tags and entity spelling do not
        // change the canonical form.
        let xml = SIGNED
            .replace("<Payload ID=\"p1\" kind=\"demo\">", "<Payload kind=\"demo\"  ID=\"p1\">")
            .replace("one &amp; two", "one &#38; two")
            .replace("></ds:Transform>", "/>");
        check(&xml).unwrap();
    }

    #[test]
    fn test_tampered_content() {
        assert_eq!(check(&SIGNED.replace("one &amp; two", "one &amp; 2")), Err(Error::BadDigest));
        assert_eq!(
            check(&SIGNED.replace("kind=\"demo\"", "kind=\"demo\" extra=\"1\"")),
            Err(Error::BadDigest)
        );
        assert_eq!(
            check(&SIGNED.replace(
                "<Item n=\"1\">",
                "<Item n=\"1\" xmlns:x=\"urn:x\" x:a=\"b\">"
            )),
            Err(Error::BadDigest)
        );
    }

    #[test]
    fn test_content_outside_target_is_not_covered() {
        check(&SIGNED.replace("<Header>h</Header>", "<Header>changed</Header>")).unwrap();
    }

    #[test]
    fn test_forged_signature_value() {
        let start = SIGNED.find("<ds:SignatureValue>\n").unwrap() + "<ds:SignatureValue>\n".len();
        let first = &SIGNED[start..start + 1];
        let replacement = if first == "A" { "B" } else { "A" };
        let xml = format!("{}{}{}", &SIGNED[..start], replacement, &SIGNED[start + 1..]);
        assert_eq!(check(&xml), Err(Error::SignatureMismatch));
    }

    #[test]
    fn test_tampered_signed_info() {
        let xml = SIGNED.replace(
            "<ds:CanonicalizationMethod Algorithm=\"http://www.w3.org/2001/10/xml-exc-c14n#\"></ds:CanonicalizationMethod>",
            "<ds:CanonicalizationMethod Algorithm=\"http://www.w3.org/2001/10/xml-exc-c14n#\"> </ds:CanonicalizationMethod>",
        );
        assert_eq!(check(&xml), Err(Error::SignatureMismatch));
    }

    #[test]
    fn test_wrong_certificate() {
        let other = cert(include_str!("../static/other-cert.b64"));
        assert_eq!(
            verify_enveloped_bytes(&other, SIGNED.as_bytes(), &PAYLOAD),
            Err(Error::SignatureMismatch)
        );
        let ec = cert(include_str!("../static/ec-cert.b64"));
        assert_eq!(
            verify_enveloped_bytes(&ec, SIGNED.as_bytes(), &PAYLOAD),
            Err(Error::NoRsaPublicKey)
        );
        assert!(matches!(
            verify_enveloped_bytes(b"junk", SIGNED.as_bytes(), &PAYLOAD),
            Err(Error::Certificate(_))
        ));
    }

    #[test]
    fn test_reference_must_point_at_target() {
        assert_eq!(
            check(&SIGNED.replace("URI=\"#p1\"", "URI=\"#p2\"")),
            Err(Error::ReferenceMismatch {
                reference: "#p2".into(),
                expected: "#p1".into(),
            })
        );
    }

    #[test]
    fn test_unsupported_algorithms() {
        let cases = [
            (
                "http://www.w3.org/2001/04/xmlenc#sha256",
                "http://www.w3.org/2000/09/xmldsig#sha1",
            ),
            (
                "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
                "http://www.w3.org/2000/09/xmldsig#rsa-sha1",
            ),
            (
                "<ds:CanonicalizationMethod Algorithm=\"http://www.w3.org/2001/10/xml-exc-c14n#\">",
                "<ds:CanonicalizationMethod Algorithm=\"http://www.w3.org/TR/2001/REC-xml-c14n-20010315\">",
            ),
            (
                "http://www.w3.org/2000/09/xmldsig#enveloped-signature",
                "http://www.w3.org/TR/1999/REC-xpath-19991116",
            ),
        ];
        for (from, to) in cases {
            assert!(
                matches!(check(&SIGNED.replace(from, to)), Err(Error::UnsupportedAlgorithm(_))),
                "{to}"
            );
        }
    }

    #[test]
    fn test_unsigned() {
        let start = SIGNED.find("<ds:Signature>").unwrap();
        let end = SIGNED.find("</ds:Signature>").unwrap() + "</ds:Signature>".len();
        let xml = format!("{}{}", &SIGNED[..start], &SIGNED[end..]);
        assert_eq!(check(&xml), Err(Error::Unsigned));
    }

    #[test]
    fn test_missing_target() {
        assert_eq!(
            verify_enveloped_bytes(
                &idp_cert(),
                SIGNED.as_bytes(),
                &[("urn:lidingo:test", "Envelope"), ("urn:lidingo:test", "Missing")]
            ),
            Err(Error::MissingElement("Missing".into()))
        );
    }
}
