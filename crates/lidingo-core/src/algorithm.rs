#![forbid(unsafe_code)]

//! Algorithm and binding URI constants.
//!
//! Each constant is the canonical URI string that appears in `Algorithm`
//! (or `Binding`) attributes.

// ── Canonicalization ─────────────────────────────────────────────────

pub const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";

// ── Digest algorithms ────────────────────────────────────────────────

pub const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";

// ── Signature algorithms ─────────────────────────────────────────────

pub const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";

// ── Transform algorithms ─────────────────────────────────────────────

pub const ENVELOPED_SIGNATURE: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";

// ── SAML bindings ────────────────────────────────────────────────────

pub const BINDING_HTTP_POST: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST";
pub const BINDING_HTTP_REDIRECT: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect";

// ── SAML name identifier formats ─────────────────────────────────────

pub const NAME_ID_FORMAT_EMAIL: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress";
