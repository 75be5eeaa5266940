#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use lidingo_core::Error;
use tracing::{info, warn};

use crate::{
    model::{self, Assertion},
    utils::{decode_xml_base64, parse_instant},
    ASSERTION_PATH,
};

/// Inputs to [`validate`].
#[derive(Debug, Clone)]
pub struct ValidateRequest<'a> {
    /// The `SAMLResponse` form field, base64.
    pub saml_response: &'a str,
    /// DER-encoded IdP signing certificate.
    pub idp_certificate: &'a [u8],
    pub idp_entity_id: &'a str,
    pub sp_entity_id: &'a str,
    pub now: DateTime<Utc>,
    /// Email domains subjects may belong to; empty allows any.
    pub allowed_domains: &'a [String],
}

/// What the response says, collected before any check runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidateResponse {
    /// `InResponseTo`: the AuthnRequest ID this answers.
    pub request_id: Option<String>,
    /// The decoded response XML.
    pub assertion: String,
    pub assertion_id: Option<String>,
    pub subject_id: Option<String>,
    /// Attribute name to its first value.
    pub attributes: BTreeMap<String, String>,
    pub session_not_on_or_after: Option<DateTime<Utc>>,
}

/// An expected value and what the response carried instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub expected: String,
    pub actual: String,
}

/// Configuration mistakes an operator can act on. At most one is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidateProblems {
    pub bad_issuer: Option<Mismatch>,
    pub bad_audience: Option<Mismatch>,
    /// The subject, when it is not an email address.
    pub bad_subject_id: Option<String>,
    /// The subject's email domain, when not one of the allowed domains.
    pub email_outside_domains: Option<String>,
}

/// A response whose signature verified. It is fully valid only when
/// `problems` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub response: ValidateResponse,
    pub problems: Option<ValidateProblems>,
}

/// A response that must not be trusted at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error}")]
pub struct Rejection {
    /// What could be read before the failure, kept for audit.
    pub response: Option<ValidateResponse>,
    #[source]
    pub error: Error,
}

impl Rejection {
    fn new(response: Option<ValidateResponse>, error: Error) -> Self {
        Self { response, error }
    }
}

impl From<Error> for Rejection {
    fn from(error: Error) -> Self {
        Self::new(None, error)
    }
}

/// Verify the signature on the first `Assertion` of a decoded response.
pub fn verify(idp_certificate: &[u8], raw_response: &[u8]) -> Result<(), Error> {
    lidingo_dsig::verify_enveloped_bytes(idp_certificate, raw_response, &ASSERTION_PATH)
}

/// Validate a SAML response.
///
/// Signature failures and an assertion outside its validity window are
/// [`Rejection`]s. Issuer, audience and subject checks run in that order
/// around the time check, and the first one that fails is reported in
/// [`Validated::problems`] without running the rest.
pub fn validate(req: &ValidateRequest<'_>) -> Result<Validated, Rejection> {
    let raw = decode_xml_base64(req.saml_response)?;
    let doc = lidingo_xml::parse(&raw)?;
    let projection = model::Response::from_document(&doc)?;
    let response = ValidateResponse::new(&projection, String::from_utf8_lossy(&raw).into_owned());

    if let Err(error) =
        lidingo_dsig::verify_enveloped(req.idp_certificate, &doc, &ASSERTION_PATH)
    {
        warn!(
            assertion_id = response.assertion_id.as_deref().unwrap_or_default(),
            %error,
            "rejecting SAML response"
        );
        return Err(Rejection::new(Some(response), error));
    }
    let Some(assertion) = projection.assertion.as_ref() else {
        // The signature check needs an assertion to succeed
        return Err(Rejection::new(
            Some(response),
            Error::MissingElement(lidingo_core::ns::node::ASSERTION.into()),
        ));
    };

    match check(req, assertion) {
        Ok(None) => {
            info!(
                subject = response.subject_id.as_deref().unwrap_or_default(),
                "validated SAML response"
            );
            Ok(Validated {
                response,
                problems: None,
            })
        }
        Ok(Some(problems)) => {
            warn!(?problems, "SAML response has problems");
            Ok(Validated {
                response,
                problems: Some(problems),
            })
        }
        Err(error) => {
            warn!(%error, "rejecting SAML response");
            Err(Rejection::new(Some(response), error))
        }
    }
}

impl ValidateResponse {
    fn new(projection: &model::Response, raw: String) -> Self {
        let assertion = projection.assertion.as_ref();
        Self {
            request_id: projection.in_response_to.clone(),
            assertion: raw,
            assertion_id: assertion.and_then(|a| a.id.clone()),
            subject_id: assertion
                .and_then(|a| a.subject.as_ref())
                .map(|s| s.name_id.clone()),
            attributes: assertion
                .map(|a| {
                    a.attributes
                        .iter()
                        .filter_map(|(name, values)| {
                            values.first().map(|v| (name.clone(), v.clone()))
                        })
                        .collect()
                })
                .unwrap_or_default(),
            session_not_on_or_after: assertion
                .and_then(|a| a.session_not_on_or_after.as_deref())
                .and_then(|t| parse_instant(t).ok()),
        }
    }
}

fn check(
    req: &ValidateRequest<'_>,
    assertion: &Assertion,
) -> Result<Option<ValidateProblems>, Error> {
    let issuer = assertion.issuer.as_deref().unwrap_or_default();
    if issuer != req.idp_entity_id {
        return Ok(Some(ValidateProblems {
            bad_issuer: Some(Mismatch {
                expected: req.idp_entity_id.to_owned(),
                actual: issuer.to_owned(),
            }),
            ..Default::default()
        }));
    }

    let audiences = assertion
        .conditions
        .as_ref()
        .map(|c| c.audiences.as_slice())
        .unwrap_or_default();
    if !audiences.iter().any(|a| a == req.sp_entity_id) {
        return Ok(Some(ValidateProblems {
            bad_audience: Some(Mismatch {
                expected: req.sp_entity_id.to_owned(),
                actual: audiences.join(" "),
            }),
            ..Default::default()
        }));
    }

    if let Some(conditions) = &assertion.conditions {
        if let Some(not_before) = &conditions.not_before {
            if req.now < parse_instant(not_before)? {
                return Err(Error::Expired);
            }
        }
        if let Some(not_on_or_after) = &conditions.not_on_or_after {
            if req.now >= parse_instant(not_on_or_after)? {
                return Err(Error::Expired);
            }
        }
    }
    if let Some(session_end) = &assertion.session_not_on_or_after {
        parse_instant(session_end)?;
    }

    let subject = assertion
        .subject
        .as_ref()
        .map(|s| s.name_id.as_str())
        .unwrap_or_default();
    let Some(domain) = email_domain(subject) else {
        return Ok(Some(ValidateProblems {
            bad_subject_id: Some(subject.to_owned()),
            ..Default::default()
        }));
    };
    if !req.allowed_domains.is_empty()
        && !req
            .allowed_domains
            .iter()
            .any(|d| d.eq_ignore_ascii_case(domain))
    {
        return Ok(Some(ValidateProblems {
            email_outside_domains: Some(domain.to_owned()),
            ..Default::default()
        }));
    }

    Ok(None)
}

/// The domain of `local@domain`, if `subject` has that shape.
fn email_domain(subject: &str) -> Option<&str> {
    let (local, domain) = subject.split_once('@')?;
    let well_formed = !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !subject.contains(char::is_whitespace);
    well_formed.then_some(domain)
}
