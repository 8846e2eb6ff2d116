//! Shared PDF handling utilities
//!
//! This crate wraps lopdf for the signature workflows: inserting empty
//! signature fields, locating fields by name, and signing an existing
//! field through an incremental update.

pub mod error;
pub mod fields;
pub mod objects;
pub mod parser;
pub mod signer;

#[cfg(test)]
pub(crate) mod test_pdf;

pub use error::PdfError;
pub use fields::{add_signature_field, find_field, list_fields, FieldInfo, SignatureFieldSpec};
pub use parser::PdfDocument;
pub use signer::{PdfSigner, SignatureMetadata};
