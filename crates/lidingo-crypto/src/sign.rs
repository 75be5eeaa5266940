#![forbid(unsafe_code)]

//! Signature algorithm implementations.

use lidingo_core::{algorithm, Error};
use rsa::signature::Verifier;

/// Verify an RSASSA-PKCS1-v1_5 signature over `data` using the algorithm
/// named by `uri`.
pub fn verify(
    uri: &str,
    key: &rsa::RsaPublicKey,
    data: &[u8],
    signature: &[u8],
) -> Result<(), Error> {
    match uri {
        algorithm::RSA_SHA256 => verify_rsa_sha256(key, data, signature),
        _ => Err(Error::UnsupportedAlgorithm(format!(
            "signature algorithm: {uri}"
        ))),
    }
}

/// Verify an RSA-SHA256 (PKCS#1 v1.5) signature over `data`.
///
/// Any failure, including a signature of the wrong length, is
/// [`Error::SignatureMismatch`].
pub fn verify_rsa_sha256(
    key: &rsa::RsaPublicKey,
    data: &[u8],
    signature: &[u8],
) -> Result<(), Error> {
    let sig = rsa::pkcs1v15::Signature::try_from(signature)
        .map_err(|_| Error::SignatureMismatch)?;
    let vk = rsa::pkcs1v15::VerifyingKey::<sha2::Sha256>::new(key.clone());
    vk.verify(data, &sig).map_err(|_| Error::SignatureMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::rsa_public_key_from_cert;
    use base64::Engine;

    fn b64(s: &str) -> Vec<u8> {
        base64::engine::general_purpose::STANDARD
            .decode(s.trim())
            .unwrap()
    }

    fn key() -> rsa::RsaPublicKey {
        rsa_public_key_from_cert(&b64(include_str!("../static/rsa-cert.b64"))).unwrap()
    }

    const SIG: &str = include_str!("../static/rsa-sha256-lidingo.sig.b64");

    #[test]
    fn test_verify_rsa_sha256() {
        verify(algorithm::RSA_SHA256, &key(), b"lidingo", &b64(SIG)).unwrap();
    }

    #[test]
    fn test_wrong_data_or_signature() {
        assert_eq!(
            verify_rsa_sha256(&key(), b"lidingo!", &b64(SIG)),
            Err(Error::SignatureMismatch)
        );
        let mut sig = b64(SIG);
        sig[10] ^= 0x01;
        assert_eq!(
            verify_rsa_sha256(&key(), b"lidingo", &sig),
            Err(Error::SignatureMismatch)
        );
        assert_eq!(
            verify_rsa_sha256(&key(), b"lidingo", &sig[..100]),
            Err(Error::SignatureMismatch)
        );
    }

    #[test]
    fn test_rsa_sha1_is_rejected() {
        let err = verify(
            "http://www.w3.org/2000/09/xmldsig#rsa-sha1",
            &key(),
            b"lidingo",
            &b64(SIG),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }
}
