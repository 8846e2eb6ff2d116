//! File-system helpers shared by the workflows

use crate::error::DocSignError;
use std::path::Path;

/// Fail with `NotFound` unless `path` exists
///
/// `what` names the input in the message, e.g. "Input PDF" or "Certificate".
pub fn ensure_exists(what: &'static str, path: &Path) -> Result<(), DocSignError> {
    if path.exists() {
        Ok(())
    } else {
        Err(DocSignError::NotFound {
            what,
            path: path.to_path_buf(),
        })
    }
}

pub(crate) fn read(path: &Path) -> Result<Vec<u8>, DocSignError> {
    std::fs::read(path).map_err(|source| DocSignError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_to_string(path: &Path) -> Result<String, DocSignError> {
    std::fs::read_to_string(path).map_err(|source| DocSignError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write(path: &Path, bytes: &[u8]) -> Result<(), DocSignError> {
    std::fs::write(path, bytes).map_err(|source| DocSignError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), len = bytes.len(), "wrote file");
    Ok(())
}
