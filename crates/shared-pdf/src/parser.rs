//! PDF parsing and manipulation using lopdf

use crate::error::PdfError;
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Where the document's AcroForm dictionary lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcroFormLocation {
    /// `/AcroForm` is a reference to an indirect dictionary
    Indirect(ObjectId),
    /// `/AcroForm` is a dictionary stored directly in the catalog
    Inline,
}

/// Wrapper around lopdf::Document for signature-field operations
pub struct PdfDocument {
    pub(crate) doc: Document,
    pub(crate) bytes: Vec<u8>,
}

impl PdfDocument {
    /// Load a PDF from raw bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PdfError> {
        let doc = Document::load_mem(&bytes).map_err(|e| PdfError::ParseError(e.to_string()))?;
        Ok(Self { doc, bytes })
    }

    /// Get the raw bytes the document was loaded from (or last saved to)
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the number of pages
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Get page object ID for a given page number (1-indexed)
    pub fn page_id(&self, page_num: u32) -> Option<ObjectId> {
        self.doc.get_pages().get(&page_num).copied()
    }

    /// Whether the trailer carries an `/Encrypt` entry
    pub fn is_encrypted(&self) -> bool {
        self.doc.trailer.get(b"Encrypt").is_ok()
    }

    /// Get read access to the internal document
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    /// Get mutable access to the internal document
    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Object ID of the document catalog
    pub fn catalog_id(&self) -> Result<ObjectId, PdfError> {
        self.doc
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::Malformed("Trailer has no /Root reference".to_string()))
    }

    /// Locate the AcroForm dictionary, if any
    pub fn acroform(&self) -> Result<Option<(AcroFormLocation, &Dictionary)>, PdfError> {
        let catalog = self
            .doc
            .catalog()
            .map_err(|e| PdfError::Malformed(format!("Failed to get catalog: {}", e)))?;

        match catalog.get(b"AcroForm") {
            Ok(Object::Reference(id)) => {
                let dict = self
                    .doc
                    .get_dictionary(*id)
                    .map_err(|_| PdfError::Malformed("AcroForm is not a dictionary".to_string()))?;
                Ok(Some((AcroFormLocation::Indirect(*id), dict)))
            }
            Ok(Object::Dictionary(dict)) => Ok(Some((AcroFormLocation::Inline, dict))),
            Ok(_) => Err(PdfError::Malformed(
                "AcroForm is neither a reference nor a dictionary".to_string(),
            )),
            Err(_) => Ok(None),
        }
    }

    /// Append an annotation reference to a page's `/Annots` array
    ///
    /// An indirect `/Annots` array is updated in place; a direct one (or a
    /// missing one) is rewritten on the page dictionary.
    pub fn add_to_page_annots(&mut self, page_id: ObjectId, annot_id: ObjectId) -> Result<(), PdfError> {
        let doc = &mut self.doc;

        let annots_ref_id = {
            let page_dict = doc
                .get_dictionary(page_id)
                .map_err(|_| PdfError::Malformed("Page is not a dictionary".to_string()))?;

            page_dict
                .get(b"Annots")
                .ok()
                .and_then(|annots_obj| annots_obj.as_reference().ok())
        };

        if let Some(annots_id) = annots_ref_id {
            let annots = doc
                .get_object_mut(annots_id)
                .map_err(|e| PdfError::Malformed(format!("Failed to get annots: {}", e)))?;
            return match annots {
                Object::Array(arr) => {
                    arr.push(Object::Reference(annot_id));
                    Ok(())
                }
                _ => Err(PdfError::Malformed(
                    "Annots reference is not an array".to_string(),
                )),
            };
        }

        let page = doc
            .get_object_mut(page_id)
            .map_err(|e| PdfError::Malformed(format!("Failed to get page object: {}", e)))?
            .as_dict_mut()
            .map_err(|_| PdfError::Malformed("Page is not a dictionary".to_string()))?;

        let mut annots = match page.get(b"Annots") {
            Ok(Object::Array(arr)) => arr.clone(),
            _ => vec![],
        };
        annots.push(Object::Reference(annot_id));
        page.set("Annots", Object::Array(annots));

        Ok(())
    }

    /// Save the document to bytes (full rewrite)
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, PdfError> {
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        self.bytes = buffer.clone();
        Ok(buffer)
    }
}
