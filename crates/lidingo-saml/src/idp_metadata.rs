#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use lidingo_core::{ns, Error};
use lidingo_xml::Element;
use tracing::debug;

use crate::{authn_request::ProtocolBinding, utils::decode_xml_base64};

/// What a service provider needs to know about an identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Metadata {
    pub idp_entity_id: String,
    /// DER-encoded signing certificate.
    pub idp_certificate: Vec<u8>,
    /// Location of the HTTP-POST SingleSignOnService.
    pub redirect_url: String,
    /// Every SingleSignOnService with a recognised binding.
    pub sso_bindings: BTreeMap<ProtocolBinding, String>,
}

/// Read IdP metadata (`md:EntityDescriptor` with an `md:IDPSSODescriptor`).
///
/// The signing certificate is taken from the first `KeyDescriptor` whose
/// `use` is `signing` or absent. An IdP without an HTTP-POST sign-on
/// endpoint is rejected with [`Error::NoPostBinding`].
pub fn parse_metadata(input: &[u8]) -> Result<Metadata, Error> {
    let doc = lidingo_xml::parse(input)?;
    let entity = &doc.root;
    if !entity.name.is(ns::MD, ns::node::ENTITY_DESCRIPTOR) {
        return Err(Error::MissingElement(ns::node::ENTITY_DESCRIPTOR.into()));
    }
    let idp_entity_id = entity
        .attr(ns::attr::ENTITY_ID)
        .ok_or_else(|| Error::MissingAttribute(ns::attr::ENTITY_ID.into()))?
        .to_owned();
    let descriptor = required(entity, ns::MD, ns::node::IDP_SSO_DESCRIPTOR)?;

    let key_descriptor = descriptor
        .children_named(ns::MD, ns::node::KEY_DESCRIPTOR)
        .find(|kd| matches!(kd.attr(ns::attr::USE), None | Some("signing")))
        .ok_or_else(|| Error::MissingElement(ns::node::KEY_DESCRIPTOR.into()))?;
    let key_info = required(key_descriptor, ns::DSIG, ns::node::KEY_INFO)?;
    let x509_data = required(key_info, ns::DSIG, ns::node::X509_DATA)?;
    let certificate = required(x509_data, ns::DSIG, ns::node::X509_CERTIFICATE)?;
    let idp_certificate = decode_xml_base64(&certificate.text())?;

    let mut sso_bindings = BTreeMap::new();
    for sso in descriptor.children_named(ns::MD, ns::node::SINGLE_SIGN_ON_SERVICE) {
        let Some(binding) = sso.attr(ns::attr::BINDING) else {
            continue;
        };
        if let Ok(binding) = binding.parse::<ProtocolBinding>() {
            let location = sso
                .attr(ns::attr::LOCATION)
                .ok_or_else(|| Error::MissingAttribute(ns::attr::LOCATION.into()))?;
            sso_bindings.entry(binding).or_insert_with(|| location.to_owned());
        }
    }
    let redirect_url = sso_bindings
        .get(&ProtocolBinding::Post)
        .cloned()
        .ok_or(Error::NoPostBinding)?;

    debug!(entity_id = %idp_entity_id, sso = %redirect_url, "parsed IdP metadata");
    Ok(Metadata {
        idp_entity_id,
        idp_certificate,
        redirect_url,
        sso_bindings,
    })
}

fn required<'e>(parent: &'e Element, uri: &str, local: &str) -> Result<&'e Element, Error> {
    parent
        .child(uri, local)
        .ok_or_else(|| Error::MissingElement(local.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_METADATA: &str = include_str!("../static/idp_metadata.xml");

    #[test]
    fn can_parse_idp_metadata() {
        let metadata = parse_metadata(SAMPLE_METADATA.as_bytes()).unwrap();
        assert_eq!(metadata.idp_entity_id, "https://idp.example.com/saml2/metadata");
        assert_eq!(metadata.redirect_url, "https://idp.example.com/sso/post");
        assert_eq!(
            metadata.sso_bindings[&ProtocolBinding::Redirect],
            "https://idp.example.com/sso/redirect"
        );
        // DER SEQUENCE
        assert_eq!(metadata.idp_certificate[0], 0x30);
        lidingo_dsig::verify::verify_enveloped_bytes(
            &metadata.idp_certificate,
            include_bytes!("../static/response.xml"),
            &crate::ASSERTION_PATH,
        )
        .unwrap();
    }

    #[test]
    fn can_parse_entra_style_metadata() {
        let metadata = parse_metadata(include_bytes!("../static/entra_metadata.xml")).unwrap();
        let tenant = "6b2e4f0c-1d3a-4e5b-9c7d-8f0a1b2c3d4e";
        assert_eq!(metadata.idp_entity_id, format!("https://sts.windows.net/{tenant}/"));
        let sso = format!("https://login.microsoftonline.com/{tenant}/saml2");
        assert_eq!(metadata.redirect_url, sso);
        assert_eq!(metadata.sso_bindings[&ProtocolBinding::Redirect], sso);
        lidingo_dsig::verify::verify_enveloped_bytes(
            &metadata.idp_certificate,
            include_bytes!("../static/entra_response.xml"),
            &crate::ASSERTION_PATH,
        )
        .unwrap();
    }

    #[test]
    fn post_binding_is_required() {
        let xml = SAMPLE_METADATA.replace(
            "<md:SingleSignOnService Binding=\"urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST\" \
             Location=\"https://idp.example.com/sso/post\"/>",
            "",
        );
        assert_eq!(parse_metadata(xml.as_bytes()), Err(Error::NoPostBinding));
    }

    #[test]
    fn encryption_keys_are_skipped() {
        let xml = SAMPLE_METADATA.replace("use=\"signing\"", "use=\"encryption\"");
        assert_eq!(
            parse_metadata(xml.as_bytes()),
            Err(Error::MissingElement("KeyDescriptor".into()))
        );
        let xml = SAMPLE_METADATA.replace(" use=\"signing\"", "");
        assert!(parse_metadata(xml.as_bytes()).is_ok());
    }

    #[test]
    fn missing_pieces() {
        let xml = SAMPLE_METADATA.replace(" entityID=\"https://idp.example.com/saml2/metadata\"", "");
        assert_eq!(
            parse_metadata(xml.as_bytes()),
            Err(Error::MissingAttribute("entityID".into()))
        );
        let xml = SAMPLE_METADATA.replace("IDPSSODescriptor", "SPSSODescriptor");
        assert_eq!(
            parse_metadata(xml.as_bytes()),
            Err(Error::MissingElement("IDPSSODescriptor".into()))
        );
        let xml = SAMPLE_METADATA.replace("X509Certificate", "X509SubjectName");
        assert_eq!(
            parse_metadata(xml.as_bytes()),
            Err(Error::MissingElement("X509Certificate".into()))
        );
        assert!(matches!(
            parse_metadata(b"<md:EntityDescriptor"),
            Err(Error::MalformedXml { .. })
        ));
    }

    #[test]
    fn bad_certificate_encoding() {
        let xml = SAMPLE_METADATA.replacen("<ds:X509Certificate>", "<ds:X509Certificate>!!", 1);
        assert!(matches!(parse_metadata(xml.as_bytes()), Err(Error::Base64(_))));
    }
}
