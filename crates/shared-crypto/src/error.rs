use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Failed to parse certificate: {0}")]
    CertificateError(String),

    #[error("Failed to parse private key: {0}")]
    KeyError(String),

    #[error("Private key does not match the certificate public key")]
    KeyMismatch,

    #[error("Failed to encode CMS structure: {0}")]
    EncodingError(String),
}

impl From<der::Error> for CryptoError {
    fn from(err: der::Error) -> Self {
        CryptoError::EncodingError(err.to_string())
    }
}
