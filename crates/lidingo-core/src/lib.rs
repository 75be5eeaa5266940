#![forbid(unsafe_code)]

//! Shared error type and constants for the Lidingo SAML service provider core.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
