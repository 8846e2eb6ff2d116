use shared_crypto::CryptoError;
use shared_pdf::PdfError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocSignError {
    #[error("{what} not found: {}", path.display())]
    NotFound { what: &'static str, path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Copy count must be at least 1")]
    NoCopies,

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
