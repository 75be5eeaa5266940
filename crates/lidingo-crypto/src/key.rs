#![forbid(unsafe_code)]

//! Public key extraction from X.509 certificates.

use der::{Decode, Encode};
use lidingo_core::Error;
use spki::DecodePublicKey;
use x509_cert::Certificate;

/// rsaEncryption: 1.2.840.113549.1.1.1
const RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";

/// Parse a DER-encoded X.509 certificate.
pub fn parse_certificate(der: &[u8]) -> Result<Certificate, Error> {
    Certificate::from_der(der).map_err(|e| Error::Certificate(format!("invalid certificate: {e}")))
}

/// Extract the RSA public key from a DER-encoded X.509 certificate.
///
/// Fails with [`Error::Certificate`] when the bytes are not a certificate
/// and [`Error::NoRsaPublicKey`] when the subject key is not RSA.
pub fn rsa_public_key_from_cert(der: &[u8]) -> Result<rsa::RsaPublicKey, Error> {
    let cert = parse_certificate(der)?;
    let spki = &cert.tbs_certificate.subject_public_key_info;
    if spki.algorithm.oid.to_string() != RSA_ENCRYPTION {
        return Err(Error::NoRsaPublicKey);
    }
    let spki_der = spki
        .to_der()
        .map_err(|e| Error::Certificate(format!("failed to encode SPKI: {e}")))?;
    rsa::RsaPublicKey::from_public_key_der(&spki_der)
        .map_err(|e| Error::Certificate(format!("invalid RSA public key: {e}")))
}
