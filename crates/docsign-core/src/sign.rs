//! Signing an existing signature field of a PDF file
//!
//! Every signature carries a document ID in its reason
//! (`"<reason> - ID: <uuid>"`), so individual signed copies can be told
//! apart after the fact.

use crate::error::DocSignError;
use crate::files::{ensure_exists, read, read_to_string, write};
use chrono::Utc;
use shared_crypto::CertificateIdentity;
use shared_pdf::{PdfDocument, PdfSigner, SignatureMetadata};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const DEFAULT_REASON: &str = "Digital signature";

/// Knobs for a signing run
#[derive(Debug, Clone)]
pub struct SignOptions {
    /// Reason text; the document ID is appended to it
    pub reason: String,
    /// Document ID for a single signature; generated when absent
    pub document_id: Option<String>,
    pub location: Option<String>,
    pub contact_info: Option<String>,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            reason: DEFAULT_REASON.to_string(),
            document_id: None,
            location: None,
            contact_info: None,
        }
    }
}

impl SignOptions {
    fn metadata(&self, field_name: &str, document_id: &str) -> SignatureMetadata {
        let mut meta = SignatureMetadata::new(field_name)
            .with_reason(format!("{} - ID: {}", self.reason, document_id))
            .with_signing_time(Utc::now());
        meta.location = self.location.clone();
        meta.contact_info = self.contact_info.clone();
        meta
    }
}

/// One signed output file
#[derive(Debug, Clone, PartialEq)]
pub struct SignedDocument {
    pub document_id: String,
    pub path: PathBuf,
}

/// Load the signer from a PEM certificate and a PEM private key
pub fn load_identity(cert_path: &Path, key_path: &Path) -> Result<CertificateIdentity, DocSignError> {
    ensure_exists("Certificate", cert_path)?;
    ensure_exists("Key", key_path)?;

    let cert_pem = read_to_string(cert_path)?;
    let key_pem = read_to_string(key_path)?;
    let identity = CertificateIdentity::from_pem(&cert_pem, &key_pem)?;

    tracing::debug!(
        subject = %identity.subject_name(),
        serial = %identity.serial_number_hex(),
        "loaded signer"
    );
    Ok(identity)
}

/// Sign `field_name` of `input` and write the result to `output`
pub fn sign_pdf_file(
    input: &Path,
    output: &Path,
    cert_path: &Path,
    key_path: &Path,
    field_name: &str,
    options: &SignOptions,
) -> Result<SignedDocument, DocSignError> {
    ensure_exists("Input PDF", input)?;
    let identity = load_identity(cert_path, key_path)?;
    let pdf = PdfDocument::from_bytes(read(input)?)?;

    let document_id = options
        .document_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let signed = PdfSigner::new(&identity).sign(&pdf, &options.metadata(field_name, &document_id))?;
    write(output, &signed)?;

    tracing::info!(output = %output.display(), %document_id, "PDF signed");
    Ok(SignedDocument {
        document_id,
        path: output.to_path_buf(),
    })
}

/// Produce `copies` signed copies of `input` in `output_dir`, each with a
/// fresh document ID, named `signed_<id>.pdf`
///
/// The directory is created if needed. `options.document_id` is ignored.
pub fn sign_copies(
    input: &Path,
    output_dir: &Path,
    cert_path: &Path,
    key_path: &Path,
    field_name: &str,
    options: &SignOptions,
    copies: usize,
) -> Result<Vec<SignedDocument>, DocSignError> {
    if copies == 0 {
        return Err(DocSignError::NoCopies);
    }
    ensure_exists("Input PDF", input)?;
    let identity = load_identity(cert_path, key_path)?;
    let pdf = PdfDocument::from_bytes(read(input)?)?;

    std::fs::create_dir_all(output_dir).map_err(|source| DocSignError::Write {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let signer = PdfSigner::new(&identity);
    let mut produced = Vec::with_capacity(copies);
    for _ in 0..copies {
        let document_id = Uuid::new_v4().to_string();
        let signed = signer.sign(&pdf, &options.metadata(field_name, &document_id))?;

        let path = output_dir.join(format!("signed_{}.pdf", document_id));
        write(&path, &signed)?;
        tracing::info!(path = %path.display(), %document_id, "signed copy written");

        produced.push(SignedDocument { document_id, path });
    }

    Ok(produced)
}
