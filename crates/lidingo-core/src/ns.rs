#![forbid(unsafe_code)]

//! XML namespace constants used across the library.

/// XML namespace, implicitly bound to the `xml` prefix.
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

/// XML Digital Signature namespace
pub const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

/// Exclusive C14N namespace (hosts `InclusiveNamespaces`)
pub const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";

/// SAML 2.0 protocol namespace
pub const SAMLP: &str = "urn:oasis:names:tc:SAML:2.0:protocol";

/// SAML 2.0 assertion namespace
pub const SAML: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// SAML 2.0 metadata namespace
pub const MD: &str = "urn:oasis:names:tc:SAML:2.0:metadata";

// ── Element names ────────────────────────────────────────────────────

pub mod node {
    // DSig elements
    pub const SIGNATURE: &str = "Signature";
    pub const SIGNED_INFO: &str = "SignedInfo";
    pub const CANONICALIZATION_METHOD: &str = "CanonicalizationMethod";
    pub const SIGNATURE_METHOD: &str = "SignatureMethod";
    pub const SIGNATURE_VALUE: &str = "SignatureValue";
    pub const DIGEST_METHOD: &str = "DigestMethod";
    pub const DIGEST_VALUE: &str = "DigestValue";
    pub const REFERENCE: &str = "Reference";
    pub const TRANSFORMS: &str = "Transforms";
    pub const TRANSFORM: &str = "Transform";
    pub const KEY_INFO: &str = "KeyInfo";
    pub const X509_DATA: &str = "X509Data";
    pub const X509_CERTIFICATE: &str = "X509Certificate";

    // Exc C14N
    pub const INCLUSIVE_NAMESPACES: &str = "InclusiveNamespaces";

    // SAML protocol / assertion elements
    pub const AUTHN_REQUEST: &str = "AuthnRequest";
    pub const RESPONSE: &str = "Response";
    pub const ASSERTION: &str = "Assertion";
    pub const ISSUER: &str = "Issuer";
    pub const SUBJECT: &str = "Subject";
    pub const NAME_ID: &str = "NameID";
    pub const CONDITIONS: &str = "Conditions";
    pub const AUDIENCE_RESTRICTION: &str = "AudienceRestriction";
    pub const AUDIENCE: &str = "Audience";
    pub const AUTHN_STATEMENT: &str = "AuthnStatement";
    pub const ATTRIBUTE_STATEMENT: &str = "AttributeStatement";
    pub const ATTRIBUTE: &str = "Attribute";
    pub const ATTRIBUTE_VALUE: &str = "AttributeValue";

    // SAML metadata elements
    pub const ENTITY_DESCRIPTOR: &str = "EntityDescriptor";
    pub const IDP_SSO_DESCRIPTOR: &str = "IDPSSODescriptor";
    pub const KEY_DESCRIPTOR: &str = "KeyDescriptor";
    pub const SINGLE_SIGN_ON_SERVICE: &str = "SingleSignOnService";
}

// ── Attribute names ──────────────────────────────────────────────────

pub mod attr {
    pub const ID: &str = "ID";
    pub const URI: &str = "URI";
    pub const ALGORITHM: &str = "Algorithm";
    pub const PREFIX_LIST: &str = "PrefixList";
    pub const VERSION: &str = "Version";
    pub const ISSUE_INSTANT: &str = "IssueInstant";
    pub const DESTINATION: &str = "Destination";
    pub const PROTOCOL_BINDING: &str = "ProtocolBinding";
    pub const ACS_URL: &str = "AssertionConsumerServiceURL";
    pub const IN_RESPONSE_TO: &str = "InResponseTo";
    pub const NOT_BEFORE: &str = "NotBefore";
    pub const NOT_ON_OR_AFTER: &str = "NotOnOrAfter";
    pub const SESSION_NOT_ON_OR_AFTER: &str = "SessionNotOnOrAfter";
    pub const NAME: &str = "Name";
    pub const ENTITY_ID: &str = "entityID";
    pub const USE: &str = "use";
    pub const BINDING: &str = "Binding";
    pub const LOCATION: &str = "Location";
}
