#![forbid(unsafe_code)]

//! Cryptographic primitives for the Lidingo SAML service provider core.
//!
//! Provides the SHA-256 digest, RSA public key extraction from X.509
//! certificates, and RSA-SHA256 (PKCS#1 v1.5) signature verification.

pub mod digest;
pub mod key;
pub mod sign;

pub use key::rsa_public_key_from_cert;
pub use rsa::RsaPublicKey;
