//! Document signing workflows over files
//!
//! Wraps the shared PDF and crypto crates with the file handling the
//! command-line tools need: pre-flight existence checks, reading inputs,
//! writing outputs, and batch generation of signed copies.

pub mod error;
pub mod files;
pub mod sigfield;
pub mod sign;

pub use error::DocSignError;
pub use files::ensure_exists;
pub use sigfield::{add_signature_field_file, AddedField};
pub use sign::{load_identity, sign_copies, sign_pdf_file, SignOptions, SignedDocument};
pub use shared_pdf::SignatureFieldSpec;
