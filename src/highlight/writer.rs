//! Writing Highlight annotations into a PDF with lopdf.

use lopdf::{dictionary, Document, Object, ObjectId, StringFormat};

use super::locate::Quad;
use crate::labels::Rgb;

/// Annotation flag: print.
const FLAG_PRINT: i64 = 4;

const MAX_PAGE_TREE_DEPTH: usize = 32;

/// One highlight to add to a page.
#[derive(Debug, Clone)]
pub struct HighlightAnnotation<'a> {
    pub quads: &'a [Quad],
    pub color: Rgb,
    /// Shown as the annotation author/title (the category).
    pub title: &'a str,
    /// Popup text (the justification).
    pub contents: &'a str,
}

/// PDF text string: literal for ASCII, UTF-16BE with BOM otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn reals(values: impl IntoIterator<Item = f32>) -> Object {
    Object::Array(values.into_iter().map(Object::from).collect())
}

/// Add a Highlight annotation to `page_id` and return the annotation's id.
///
/// Returns `None` without touching the document when there are no quads. The
/// page's `Annots` entry may be absent, an inline array, or a reference to an
/// array; all three are extended in place.
pub fn add_highlight(
    doc: &mut Document,
    page_id: ObjectId,
    annotation: &HighlightAnnotation<'_>,
) -> Result<Option<ObjectId>, lopdf::Error> {
    let Some(rect) = annotation
        .quads
        .iter()
        .copied()
        .reduce(|a, b| a.union(&b))
    else {
        return Ok(None);
    };

    let Rgb(r, g, b) = annotation.color;
    let annot_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Annot".to_vec()),
        "Subtype" => Object::Name(b"Highlight".to_vec()),
        "Rect" => reals([rect.x0, rect.y0, rect.x1, rect.y1]),
        "QuadPoints" => reals(annotation.quads.iter().flat_map(Quad::points)),
        "C" => reals([r, g, b]),
        "T" => text_string(annotation.title),
        "Contents" => text_string(annotation.contents),
        "F" => Object::Integer(FLAG_PRINT),
        "P" => Object::Reference(page_id),
    });

    let existing = doc
        .get_object(page_id)?
        .as_dict()?
        .get(b"Annots")
        .ok()
        .cloned();

    match existing {
        Some(Object::Reference(array_id)) => {
            doc.get_object_mut(array_id)?
                .as_array_mut()?
                .push(Object::Reference(annot_id));
        }
        Some(Object::Array(mut annots)) => {
            annots.push(Object::Reference(annot_id));
            doc.get_object_mut(page_id)?
                .as_dict_mut()?
                .set("Annots", Object::Array(annots));
        }
        _ => {
            doc.get_object_mut(page_id)?
                .as_dict_mut()?
                .set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
        }
    }

    Ok(Some(annot_id))
}

/// Lower-left corner of the page's MediaBox, following inherited values.
///
/// Falls back to `(0, 0)` when no usable MediaBox is found.
pub fn media_box_origin(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let mut current = doc.get_dictionary(page_id).ok();
    // Parent chains are bounded against cycles
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        let Some(dict) = current else {
            break;
        };
        if let Ok(media_box) = dict.get(b"MediaBox") {
            let media_box = match media_box {
                Object::Reference(id) => doc.get_object(*id).ok(),
                other => Some(other),
            };
            let corners: Option<Vec<f32>> = media_box
                .and_then(|b| b.as_array().ok())
                .map(|values| values.iter().filter_map(|v| v.as_float().ok()).collect());
            if let Some([x0, y0, x1, y1]) = corners.as_deref() {
                return (x0.min(*x1), y0.min(*y1));
            }
            break;
        }
        current = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .ok()
            .and_then(|id| doc.get_dictionary(id).ok());
    }
    (0.0, 0.0)
}
