//! Adding an empty signature field to a PDF file

use crate::error::DocSignError;
use crate::files::{ensure_exists, read, write};
use shared_pdf::{add_signature_field, PdfDocument, SignatureFieldSpec};
use std::path::Path;

/// What was written by [`add_signature_field_file`]
#[derive(Debug, Clone, PartialEq)]
pub struct AddedField {
    pub name: String,
    pub page: u32,
    pub page_count: usize,
}

/// Read `input`, insert the field described by `spec`, and save the whole
/// document to `output`
pub fn add_signature_field_file(
    input: &Path,
    output: &Path,
    spec: &SignatureFieldSpec,
) -> Result<AddedField, DocSignError> {
    ensure_exists("Input PDF", input)?;

    let mut pdf = PdfDocument::from_bytes(read(input)?)?;
    add_signature_field(&mut pdf, spec)?;
    let bytes = pdf.save_to_bytes()?;
    write(output, &bytes)?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        field = %spec.name,
        page = spec.page,
        "signature field added"
    );

    Ok(AddedField {
        name: spec.name.clone(),
        page: spec.page,
        page_count: pdf.page_count(),
    })
}
