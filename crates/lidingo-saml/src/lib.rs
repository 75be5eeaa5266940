#![forbid(unsafe_code)]

//! SAML 2.0 service provider engine.
//!
//! Builds AuthnRequests, reads IdP metadata and validates the responses an
//! IdP posts back: the assertion signature first, then issuer, audience,
//! validity window and subject.

mod authn_request;
mod idp_metadata;
pub mod model;
mod response;
mod utils;

use chrono::{DateTime, Utc};
use lidingo_core::ns;
use lidingo_xml::path::Step;

pub use authn_request::{init, init_with_destination, new_request_id, InitResponse, ProtocolBinding};
pub use idp_metadata::{parse_metadata, Metadata};
pub use response::{
    validate, verify, Mismatch, Rejection, ValidateProblems, ValidateRequest, ValidateResponse,
    Validated,
};
pub use utils::{decode_xml_base64, format_instant, parse_instant};

/// Where the signed assertion sits in a response.
pub const ASSERTION_PATH: [Step<'static>; 2] = [
    (ns::SAMLP, ns::node::RESPONSE),
    (ns::SAML, ns::node::ASSERTION),
];

/// Service provider settings shared by every login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceProvider {
    pub entity_id: String,
    /// Assertion Consumer Service URL the IdP posts responses to.
    pub acs_url: String,
    /// Email domains users may sign in from; empty allows any.
    pub allowed_domains: Vec<String>,
}

impl ServiceProvider {
    pub fn new(entity_id: &str, acs_url: &str) -> Self {
        Self {
            entity_id: entity_id.into(),
            acs_url: acs_url.into(),
            allowed_domains: Vec::new(),
        }
    }

    pub fn allowed_domains(self, domains: &[&str]) -> Self {
        Self {
            allowed_domains: domains.iter().map(|d| d.to_string()).collect(),
            ..self
        }
    }

    /// An AuthnRequest addressed to the IdP's HTTP-POST endpoint.
    pub fn authn_request(
        &self,
        request_id: &str,
        idp: &Metadata,
        now: DateTime<Utc>,
    ) -> InitResponse {
        init_with_destination(request_id, &self.entity_id, &self.acs_url, &idp.redirect_url, now)
    }

    /// Validate a `SAMLResponse` from `idp`.
    pub fn validate(
        &self,
        saml_response: &str,
        idp: &Metadata,
        now: DateTime<Utc>,
    ) -> Result<Validated, Rejection> {
        validate(&ValidateRequest {
            saml_response,
            idp_certificate: &idp.idp_certificate,
            idp_entity_id: &idp.idp_entity_id,
            sp_entity_id: &self.entity_id,
            now,
            allowed_domains: &self.allowed_domains,
        })
    }
}
