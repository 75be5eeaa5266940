#![forbid(unsafe_code)]

//! XML Digital Signature (XML-DSig) verification.
//!
//! Verifies enveloped signatures made with exclusive canonicalization,
//! SHA-256 and RSA-SHA256, the profile SAML identity providers sign
//! assertions with.

pub mod signature;
pub mod verify;

pub use signature::Signature;
pub use verify::{verify_enveloped, verify_enveloped_bytes};
