use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TextRowsError {
    #[error("Failed to run '{program}': {source}")]
    TesseractSpawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Tesseract exited with {status}: {stderr}")]
    TesseractFailed { status: String, stderr: String },

    #[error("Malformed TSV at line {line}: {message}")]
    Tsv { line: usize, message: String },

    #[error("Failed to decode image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to save {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0} has no file name")]
    NoFileStem(PathBuf),
}
