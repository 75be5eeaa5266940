#![forbid(unsafe_code)]

use std::{fmt::Display, str::FromStr};

use base64::{prelude::BASE64_STANDARD, Engine};
use chrono::{DateTime, Utc};
use lidingo_core::{algorithm, ns};
use lidingo_xml::{writer, Attr, Element, Name};
use tracing::debug;

use crate::utils::{format_instant, random_hex};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolBinding {
    #[default]
    Post,
    Redirect,
}

impl ProtocolBinding {
    pub fn uri(&self) -> &'static str {
        match self {
            ProtocolBinding::Post => algorithm::BINDING_HTTP_POST,
            ProtocolBinding::Redirect => algorithm::BINDING_HTTP_REDIRECT,
        }
    }
}

impl Display for ProtocolBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.uri())
    }
}

impl FromStr for ProtocolBinding {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            algorithm::BINDING_HTTP_POST => Ok(ProtocolBinding::Post),
            algorithm::BINDING_HTTP_REDIRECT => Ok(ProtocolBinding::Redirect),
            _ => Err(()),
        }
    }
}

/// An AuthnRequest ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitResponse {
    /// Base64 of `request_xml`, for the `SAMLRequest` form field.
    pub saml_request: String,
    /// The request as serialized, kept by the caller to correlate the
    /// IdP's response.
    pub request_xml: String,
}

/// Fresh request identifier: `id_` followed by 32 random hex characters.
pub fn new_request_id() -> String {
    format!("id_{}", random_hex(32))
}

/// Build a minimal AuthnRequest: `ID`, `Version`, `IssueInstant` and an
/// `Issuer` naming the service provider.
pub fn init(request_id: &str, sp_entity_id: &str, now: DateTime<Utc>) -> InitResponse {
    encode(base_request(request_id, sp_entity_id, now))
}

/// Like [`init`], and also names the IdP endpoint the request is posted to
/// and where the IdP should post its response back.
pub fn init_with_destination(
    request_id: &str,
    sp_entity_id: &str,
    acs_url: &str,
    destination: &str,
    now: DateTime<Utc>,
) -> InitResponse {
    let mut request = base_request(request_id, sp_entity_id, now);
    // Attributes go ahead of the Issuer child, after IssueInstant
    request.attrs.extend([
        Attr::new(Name::split(ns::attr::DESTINATION), destination),
        Attr::new(
            Name::split(ns::attr::PROTOCOL_BINDING),
            ProtocolBinding::Post.uri(),
        ),
        Attr::new(Name::split(ns::attr::ACS_URL), acs_url),
    ]);
    encode(request)
}

fn base_request(request_id: &str, sp_entity_id: &str, now: DateTime<Utc>) -> Element {
    Element::new(Name::new(ns::SAMLP, "samlp", ns::node::AUTHN_REQUEST))
        .with_namespace("samlp", ns::SAMLP)
        .with_namespace("saml", ns::SAML)
        .with_attr(Name::split(ns::attr::ID), request_id)
        .with_attr(Name::split(ns::attr::VERSION), "2.0")
        .with_attr(Name::split(ns::attr::ISSUE_INSTANT), format_instant(now))
        .with_child(
            Element::new(Name::new(ns::SAML, "saml", ns::node::ISSUER)).with_text(sp_entity_id),
        )
}

fn encode(request: Element) -> InitResponse {
    let request_xml = writer::to_string(&request);
    debug!(request = %request_xml, "built AuthnRequest");
    InitResponse {
        saml_request: BASE64_STANDARD.encode(&request_xml),
        request_xml,
    }
}
