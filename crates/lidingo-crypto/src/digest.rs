#![forbid(unsafe_code)]

//! Digest (hash) algorithm implementations.

use lidingo_core::{algorithm, Error};
use sha2::{Digest, Sha256};

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> Vec<u8> {
    Sha256::digest(data).to_vec()
}

/// Compute a digest in one shot, selecting the algorithm by URI.
pub fn digest(uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
    match uri {
        algorithm::SHA256 => Ok(sha256(data)),
        _ => Err(Error::UnsupportedAlgorithm(format!(
            "digest algorithm: {uri}"
        ))),
    }
}
