#![forbid(unsafe_code)]

//! Lidingo: the core of a SAML 2.0 service provider.
//!
//! Re-exports the member crates under short names, plus the handful of
//! entry points most callers need.

pub use lidingo_c14n as c14n;
pub use lidingo_core as core;
pub use lidingo_crypto as crypto;
pub use lidingo_dsig as dsig;
pub use lidingo_saml as saml;
pub use lidingo_xml as xml;

pub use lidingo_core::{Error, Result};
pub use lidingo_saml::{
    init, parse_metadata, validate, InitResponse, Metadata, Rejection, ServiceProvider,
    ValidateProblems, ValidateRequest, ValidateResponse, Validated,
};
