#![forbid(unsafe_code)]

/// Errors produced by the Lidingo SAML service provider core.
///
/// Protocol-level mismatches (wrong issuer, wrong audience, unexpected
/// subject) are not errors; they are reported as `ValidateProblems` by the
/// SAML engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("malformed XML at byte {offset}: {message}")]
    MalformedXml { offset: usize, message: String },

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("IdP metadata has no HTTP-POST SingleSignOnService")]
    NoPostBinding,

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("assertion is not signed")]
    Unsigned,

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("signature reference {reference} does not point at {expected}")]
    ReferenceMismatch { reference: String, expected: String },

    #[error("digest mismatch: assertion content does not match DigestValue")]
    BadDigest,

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("certificate does not carry an RSA public key")]
    NoRsaPublicKey,

    #[error("signature verification failed")]
    SignatureMismatch,

    #[error("assertion is outside its validity window")]
    Expired,
}

impl Error {
    /// Shorthand for a `MalformedXml` error at `offset`.
    pub fn malformed(offset: usize, message: impl Into<String>) -> Self {
        Self::MalformedXml {
            offset,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
