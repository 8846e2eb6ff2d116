//! Signing an existing signature field through an incremental update
//!
//! The original file is never rewritten. lopdf's `IncrementalDocument`
//! appends one update section carrying:
//! - a new signature dictionary (`/Type /Sig`) with a zero-filled
//!   `/Contents` placeholder and a sentinel `/ByteRange`
//! - the field dictionary with `/V` pointing at the signature
//! - the AcroForm (or catalog, when the AcroForm is inline) if `/SigFlags`
//!   has to be raised
//!
//! Once saved, both placeholders are located in the update section, the
//! ByteRange is patched in place, the covered bytes are hashed, and the
//! DER-encoded CMS is hex-written into `/Contents`.

use crate::error::PdfError;
use crate::fields::{list_fields, SIG_FLAGS};
use crate::objects::text_string;
use crate::parser::{AcroFormLocation, PdfDocument};
use chrono::{DateTime, Utc};
use lopdf::{Dictionary, IncrementalDocument, Object, ObjectId, StringFormat};
use shared_crypto::cms::build_detached_signed_data;
use shared_crypto::keys::{sha256_parts, SigningIdentity};

/// Default space reserved for the CMS blob, in bytes (hex doubles it)
pub const DEFAULT_PLACEHOLDER_SIZE: usize = 8192;

/// Ten-digit offsets keep the placeholder wide enough for any real ByteRange
const BYTE_RANGE_SENTINEL: i64 = 9_999_999_999;

/// Values written into the signature dictionary
#[derive(Debug, Clone)]
pub struct SignatureMetadata {
    /// Fully qualified name of the field to sign
    pub field_name: String,
    pub reason: Option<String>,
    pub location: Option<String>,
    pub contact_info: Option<String>,
    pub signing_time: DateTime<Utc>,
}

impl SignatureMetadata {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            reason: None,
            location: None,
            contact_info: None,
            signing_time: Utc::now(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_contact_info(mut self, contact_info: impl Into<String>) -> Self {
        self.contact_info = Some(contact_info.into());
        self
    }

    pub fn with_signing_time(mut self, signing_time: DateTime<Utc>) -> Self {
        self.signing_time = signing_time;
        self
    }
}

/// Handles PDF digital signature operations
pub struct PdfSigner<'a, I: SigningIdentity + ?Sized> {
    identity: &'a I,
    placeholder_size: usize,
}

impl<'a, I: SigningIdentity + ?Sized> PdfSigner<'a, I> {
    pub fn new(identity: &'a I) -> Self {
        Self {
            identity,
            placeholder_size: DEFAULT_PLACEHOLDER_SIZE,
        }
    }

    /// Reserve `size` bytes for the CMS blob instead of the default
    pub fn with_placeholder_size(mut self, size: usize) -> Self {
        self.placeholder_size = size;
        self
    }

    /// Sign the named field, returning the original bytes plus one update section
    pub fn sign(&self, pdf: &PdfDocument, meta: &SignatureMetadata) -> Result<Vec<u8>, PdfError> {
        if pdf.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        // Step 1: Locate the target field
        let fields = list_fields(pdf.doc())?;
        let field = fields
            .iter()
            .find(|field| field.name == meta.field_name)
            .ok_or_else(|| PdfError::FieldNotFound {
                name: meta.field_name.clone(),
                available: available_signature_fields(&fields),
            })?;
        if !field.is_signature() {
            return Err(PdfError::NotASignatureField(field.name.clone()));
        }
        if field.has_value {
            return Err(PdfError::AlreadySigned(field.name.clone()));
        }

        let mut update = IncrementalDocument::create_from(pdf.bytes().to_vec(), pdf.doc().clone());
        // Hybrid-file and predictor entries describe the previous section only
        update.new_document.trailer.remove(b"XRefStm");
        update.new_document.trailer.remove(b"DecodeParms");

        // Step 2: Signature dictionary with placeholders
        let sig_id = update
            .new_document
            .add_object(self.signature_dictionary(meta));

        // Step 3: Field value and SigFlags
        set_entry(&mut update, field.id, "V", Object::Reference(sig_id))?;
        self.raise_sig_flags(pdf, &mut update)?;

        let mut output = Vec::with_capacity(pdf.bytes().len() + self.placeholder_size * 2 + 4096);
        update
            .save_to(&mut output)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        // Step 4: ByteRange covers everything except the <...> contents string
        let update_start = pdf.bytes().len();
        let contents_at = find_contents(&output, update_start)?;
        let contents_end = contents_at + self.placeholder_size * 2 + 2;
        if output.get(contents_end - 1) != Some(&b'>') {
            return Err(PdfError::Malformed(
                "Contents placeholder has an unexpected length".to_string(),
            ));
        }
        let byte_range = [
            0,
            contents_at,
            contents_end,
            output.len() - contents_end,
        ];
        replace_byte_range(&mut output, update_start, &byte_range)?;

        // Step 5: Hash, build CMS, inject
        let digest = sha256_parts(&[&output[..contents_at], &output[contents_end..]]);
        let cms = build_detached_signed_data(self.identity, &digest, meta.signing_time)?;

        if cms.len() > self.placeholder_size {
            return Err(PdfError::SignatureTooLarge {
                size: cms.len(),
                capacity: self.placeholder_size,
            });
        }

        let sig_hex = hex::encode_upper(&cms);
        // Skip the opening '<'; the remainder of the placeholder stays zero
        let hex_start = contents_at + 1;
        output[hex_start..hex_start + sig_hex.len()].copy_from_slice(sig_hex.as_bytes());

        tracing::info!(
            field = %meta.field_name,
            signer = %self.identity.signer_name(),
            cms_len = cms.len(),
            output_len = output.len(),
            "signed PDF"
        );

        Ok(output)
    }

    /// Text entries first; `/ByteRange` and `/Contents` stay last so they are
    /// the final occurrences of their keys in the update section
    fn signature_dictionary(&self, meta: &SignatureMetadata) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Sig".to_vec()));
        dict.set("Filter", Object::Name(b"Adobe.PPKLite".to_vec()));
        dict.set("SubFilter", Object::Name(b"adbe.pkcs7.detached".to_vec()));
        dict.set("Name", text_string(self.identity.signer_name()));
        dict.set("M", text_string(&pdf_date(meta.signing_time)));
        if let Some(reason) = &meta.reason {
            dict.set("Reason", text_string(reason));
        }
        if let Some(location) = &meta.location {
            dict.set("Location", text_string(location));
        }
        if let Some(contact_info) = &meta.contact_info {
            dict.set("ContactInfo", text_string(contact_info));
        }

        dict.set(
            "ByteRange",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(BYTE_RANGE_SENTINEL),
                Object::Integer(BYTE_RANGE_SENTINEL),
                Object::Integer(BYTE_RANGE_SENTINEL),
            ]),
        );
        dict.set(
            "Contents",
            Object::String(vec![0u8; self.placeholder_size], StringFormat::Hexadecimal),
        );
        dict
    }

    /// Update the AcroForm (or catalog) when SigFlags lacks bits 1 and 2
    fn raise_sig_flags(
        &self,
        pdf: &PdfDocument,
        update: &mut IncrementalDocument,
    ) -> Result<(), PdfError> {
        let Some((location, acroform)) = pdf.acroform()? else {
            return Ok(());
        };

        let current = acroform
            .get(b"SigFlags")
            .and_then(Object::as_i64)
            .unwrap_or(0);
        if current & SIG_FLAGS == SIG_FLAGS {
            return Ok(());
        }
        let raised = Object::Integer(current | SIG_FLAGS);

        match location {
            AcroFormLocation::Indirect(id) => set_entry(update, id, "SigFlags", raised)?,
            AcroFormLocation::Inline => {
                let mut updated = acroform.clone();
                updated.set("SigFlags", raised);
                set_entry(update, pdf.catalog_id()?, "AcroForm", Object::Dictionary(updated))?;
            }
        }

        tracing::debug!(from = current, to = current | SIG_FLAGS, "raised AcroForm SigFlags");
        Ok(())
    }
}

/// Copy a dictionary into the update section and set one entry on it
fn set_entry(
    update: &mut IncrementalDocument,
    id: ObjectId,
    key: &str,
    value: Object,
) -> Result<(), PdfError> {
    update
        .opt_clone_object_to_new_document(id)
        .map_err(|e| PdfError::Malformed(format!("Failed to copy object {:?}: {}", id, e)))?;
    update
        .new_document
        .get_object_mut(id)
        .and_then(Object::as_dict_mut)
        .map_err(|_| PdfError::Malformed(format!("Object {:?} is not a dictionary", id)))?
        .set(key, value);
    Ok(())
}

/// Offset of the `<` opening the last `/Contents` string at or after `from`
fn find_contents(pdf_bytes: &[u8], from: usize) -> Result<usize, PdfError> {
    let marker = find_last_occurrence(&pdf_bytes[from..], b"/Contents")
        .map(|pos| from + pos)
        .ok_or_else(|| PdfError::Malformed("Could not find /Contents marker".to_string()))?;

    pdf_bytes[marker..]
        .iter()
        .position(|&b| b == b'<')
        .map(|pos| marker + pos)
        .ok_or_else(|| PdfError::Malformed("Contents placeholder is not a hex string".to_string()))
}

/// Overwrite the last `/ByteRange` array at or after `from`, padding with
/// spaces to keep its width
fn replace_byte_range(
    pdf_bytes: &mut [u8],
    from: usize,
    byte_range: &[usize; 4],
) -> Result<(), PdfError> {
    let marker = find_last_occurrence(&pdf_bytes[from..], b"/ByteRange")
        .map(|pos| from + pos)
        .ok_or_else(|| PdfError::Malformed("Could not find /ByteRange marker".to_string()))?;

    let bracket_start = pdf_bytes[marker..]
        .iter()
        .position(|&b| b == b'[')
        .map(|pos| marker + pos);
    let bracket_end = bracket_start.and_then(|start| {
        pdf_bytes[start..]
            .iter()
            .position(|&b| b == b']')
            .map(|pos| start + pos + 1)
    });
    let (Some(bracket_start), Some(bracket_end)) = (bracket_start, bracket_end) else {
        return Err(PdfError::Malformed("ByteRange is not an array".to_string()));
    };

    let actual = format!(
        "[{} {} {} {}]",
        byte_range[0], byte_range[1], byte_range[2], byte_range[3]
    );
    let width = bracket_end - bracket_start;
    if actual.len() > width {
        return Err(PdfError::Malformed(format!(
            "ByteRange {} does not fit its placeholder",
            actual
        )));
    }

    let padded = format!("{:<width$}", actual, width = width);
    pdf_bytes[bracket_start..bracket_end].copy_from_slice(padded.as_bytes());
    Ok(())
}

/// Find the last occurrence of a pattern in bytes
fn find_last_occurrence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let len = needle.len();
    if len == 0 || len > haystack.len() {
        return None;
    }

    (0..=(haystack.len() - len))
        .rev()
        .find(|&i| &haystack[i..i + len] == needle)
}

/// Format a timestamp as a PDF date string
pub fn pdf_date(time: DateTime<Utc>) -> String {
    time.format("D:%Y%m%d%H%M%S+00'00'").to_string()
}

fn available_signature_fields(fields: &[crate::fields::FieldInfo]) -> String {
    let names: Vec<&str> = fields
        .iter()
        .filter(|field| field.is_signature())
        .map(|field| field.name.as_str())
        .collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}
