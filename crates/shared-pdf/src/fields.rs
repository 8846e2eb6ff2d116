//! Signature form fields: insertion and lookup
//!
//! A signature field is written as two indirect objects, following the
//! field/widget split of the AcroForm model:
//!
//! ```text
//! field:  << /FT /Sig /T (name) /Kids [widget] >>
//! widget: << /Type /Annot /Subtype /Widget /Rect [..] /P page /Parent field /F 132 >>
//! ```
//!
//! The widget is listed in the page's `/Annots`; the field is listed in the
//! catalog's `/AcroForm /Fields` with `/SigFlags 3`.

use crate::error::PdfError;
use crate::objects::{decode_text_string, text_string};
use crate::parser::{AcroFormLocation, PdfDocument};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;

/// AcroForm SigFlags: SignaturesExist | AppendOnly
pub const SIG_FLAGS: i64 = 3;

/// Annotation flags: Print (4) | Locked (128)
pub const WIDGET_FLAGS: i64 = 132;

/// Placement of a new, empty signature field
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureFieldSpec {
    pub name: String,
    /// 1-indexed page number
    pub page: u32,
    /// Widget rectangle as [x1, y1, x2, y2] in PDF user space
    pub rect: [f64; 4],
    pub flags: i64,
}

impl SignatureFieldSpec {
    /// Invisible-size widget in the bottom-left corner of the first page
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            page: 1,
            rect: [0.0, 0.0, 100.0, 50.0],
            flags: WIDGET_FLAGS,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_rect(mut self, rect: [f64; 4]) -> Self {
        self.rect = rect;
        self
    }
}

impl Default for SignatureFieldSpec {
    fn default() -> Self {
        Self::new("Signature1")
    }
}

/// A form field found in the AcroForm tree
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub id: ObjectId,
    /// Fully qualified name (partial names joined with '.')
    pub name: String,
    /// Field type, inherited from ancestors when absent
    pub field_type: Option<Vec<u8>>,
    /// Whether the field has a value (`/V`)
    pub has_value: bool,
}

impl FieldInfo {
    pub fn is_signature(&self) -> bool {
        self.field_type.as_deref() == Some(b"Sig".as_slice())
    }
}

/// Insert an empty signature field and its widget annotation
///
/// Returns the object ID of the new field dictionary.
pub fn add_signature_field(
    pdf: &mut PdfDocument,
    spec: &SignatureFieldSpec,
) -> Result<ObjectId, PdfError> {
    if pdf.page_count() == 0 {
        return Err(PdfError::NoPages);
    }
    let page_id = pdf
        .page_id(spec.page)
        .ok_or(PdfError::PageNotFound(spec.page))?;

    if list_fields(pdf.doc())?
        .iter()
        .any(|field| field.name == spec.name)
    {
        return Err(PdfError::FieldExists(spec.name.clone()));
    }

    let doc = pdf.doc_mut();
    let field_id = doc.new_object_id();

    let mut widget = Dictionary::new();
    widget.set("Type", Object::Name(b"Annot".to_vec()));
    widget.set("Subtype", Object::Name(b"Widget".to_vec()));
    widget.set(
        "Rect",
        Object::Array(spec.rect.iter().map(|v| Object::Real(*v as f32)).collect()),
    );
    widget.set("P", Object::Reference(page_id));
    widget.set("Parent", Object::Reference(field_id));
    widget.set("F", Object::Integer(spec.flags));
    let widget_id = doc.add_object(Object::Dictionary(widget));

    let mut field = Dictionary::new();
    field.set("FT", Object::Name(b"Sig".to_vec()));
    field.set("T", text_string(&spec.name));
    field.set("Kids", Object::Array(vec![Object::Reference(widget_id)]));
    doc.objects.insert(field_id, Object::Dictionary(field));

    pdf.add_to_page_annots(page_id, widget_id)?;
    register_field(pdf, field_id)?;

    tracing::debug!(
        name = %spec.name,
        page = spec.page,
        ?field_id,
        ?widget_id,
        "added signature field"
    );

    Ok(field_id)
}

/// Add the field to `/AcroForm /Fields`, creating the AcroForm if needed
fn register_field(pdf: &mut PdfDocument, field_id: ObjectId) -> Result<(), PdfError> {
    let location = pdf.acroform()?.map(|(location, _)| location);

    let acroform: &mut Dictionary = match location {
        Some(AcroFormLocation::Indirect(id)) => pdf
            .doc_mut()
            .get_object_mut(id)
            .and_then(Object::as_dict_mut)
            .map_err(|_| PdfError::Malformed("AcroForm is not a dictionary".to_string()))?,
        Some(AcroFormLocation::Inline) => pdf
            .doc_mut()
            .catalog_mut()
            .map_err(|e| PdfError::Malformed(format!("Failed to get catalog: {}", e)))?
            .get_mut(b"AcroForm")
            .and_then(Object::as_dict_mut)
            .map_err(|_| PdfError::Malformed("AcroForm is not a dictionary".to_string()))?,
        None => {
            let mut acroform = Dictionary::new();
            acroform.set("Fields", Object::Array(vec![Object::Reference(field_id)]));
            acroform.set("SigFlags", Object::Integer(SIG_FLAGS));
            let doc = pdf.doc_mut();
            let acroform_id = doc.add_object(Object::Dictionary(acroform));
            doc.catalog_mut()
                .map_err(|e| PdfError::Malformed(format!("Failed to get catalog: {}", e)))?
                .set("AcroForm", Object::Reference(acroform_id));
            return Ok(());
        }
    };

    acroform.set("SigFlags", Object::Integer(SIG_FLAGS));
    let fields_ref = match acroform.get(b"Fields") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };

    match fields_ref {
        Some(fields_id) => match pdf.doc_mut().get_object_mut(fields_id) {
            Ok(Object::Array(fields)) => fields.push(Object::Reference(field_id)),
            _ => {
                return Err(PdfError::Malformed(
                    "AcroForm /Fields is not an array".to_string(),
                ))
            }
        },
        None => {
            let mut fields = match acroform.get(b"Fields") {
                Ok(Object::Array(arr)) => arr.clone(),
                _ => vec![],
            };
            fields.push(Object::Reference(field_id));
            acroform.set("Fields", Object::Array(fields));
        }
    }

    Ok(())
}

/// Collect every named field reachable from `/AcroForm /Fields`
pub fn list_fields(doc: &Document) -> Result<Vec<FieldInfo>, PdfError> {
    let catalog = doc
        .catalog()
        .map_err(|e| PdfError::Malformed(format!("Failed to get catalog: {}", e)))?;

    let acroform = match catalog.get(b"AcroForm") {
        Ok(Object::Reference(id)) => match doc.get_dictionary(*id) {
            Ok(dict) => dict,
            Err(_) => return Ok(vec![]),
        },
        Ok(Object::Dictionary(dict)) => dict,
        _ => return Ok(vec![]),
    };

    let roots = match acroform.get(b"Fields") {
        Ok(Object::Array(arr)) => arr.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(arr)) => arr.clone(),
            _ => vec![],
        },
        _ => vec![],
    };

    let mut found = Vec::new();
    let mut visited = HashSet::new();
    for root in &roots {
        if let Object::Reference(id) = root {
            collect_fields(doc, *id, None, None, &mut visited, &mut found);
        } else {
            tracing::debug!("skipping direct (non-indirect) field object");
        }
    }

    Ok(found)
}

fn collect_fields(
    doc: &Document,
    id: ObjectId,
    parent_name: Option<&str>,
    inherited_type: Option<&[u8]>,
    visited: &mut HashSet<ObjectId>,
    found: &mut Vec<FieldInfo>,
) {
    if !visited.insert(id) {
        return;
    }
    let Ok(dict) = doc.get_dictionary(id) else {
        return;
    };

    let partial = match dict.get(b"T") {
        Ok(Object::String(bytes, _)) => Some(decode_text_string(bytes)),
        _ => None,
    };
    let name = match (parent_name, partial) {
        (Some(parent), Some(partial)) => Some(format!("{}.{}", parent, partial)),
        (None, Some(partial)) => Some(partial),
        (parent, None) => parent.map(str::to_string),
    };

    let field_type = match dict.get(b"FT") {
        Ok(Object::Name(ft)) => Some(ft.as_slice()),
        _ => inherited_type,
    };

    if dict.has(b"T") {
        if let Some(name) = &name {
            found.push(FieldInfo {
                id,
                name: name.clone(),
                field_type: field_type.map(<[u8]>::to_vec),
                has_value: dict.has(b"V"),
            });
        }
    }

    if let Ok(Object::Array(kids)) = dict.get(b"Kids") {
        for kid in kids {
            if let Object::Reference(kid_id) = kid {
                collect_fields(doc, *kid_id, name.as_deref(), field_type, visited, found);
            }
        }
    }
}

/// Find a field by its fully qualified name
pub fn find_field(doc: &Document, name: &str) -> Result<Option<FieldInfo>, PdfError> {
    Ok(list_fields(doc)?.into_iter().find(|field| field.name == name))
}
