//! Shared cryptography utilities
//!
//! This crate loads signer credentials (X.509 certificate plus P-256
//! private key) and builds the detached CMS SignedData blobs embedded in
//! PDF signature dictionaries.

pub mod cert;
pub mod cms;
pub mod error;
pub mod keys;

pub use cert::CertificateIdentity;
pub use error::CryptoError;
pub use keys::{sha256, SigningIdentity};
