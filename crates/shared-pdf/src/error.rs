use shared_crypto::CryptoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("PDF parse error: {0}")]
    ParseError(String),

    #[error("Document has no pages")]
    NoPages,

    #[error("Page {0} not found")]
    PageNotFound(u32),

    #[error("Malformed PDF structure: {0}")]
    Malformed(String),

    #[error("A form field named '{0}' already exists")]
    FieldExists(String),

    #[error("Signature field '{name}' not found (available: {available})")]
    FieldNotFound { name: String, available: String },

    #[error("Field '{0}' is not a signature field")]
    NotASignatureField(String),

    #[error("Signature field '{0}' is already signed")]
    AlreadySigned(String),

    #[error("Encrypted PDFs are not supported")]
    Encrypted,

    #[error("Signature too large: {size} bytes (max {capacity})")]
    SignatureTooLarge { size: usize, capacity: usize },

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
