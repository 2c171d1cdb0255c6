//! Page-level object manipulation using lopdf
//!
//! Helpers for reading inherited page attributes and for adding XObjects and
//! content streams to individual pages without disturbing other pages that
//! may share the same resources.

use lopdf::{Dictionary, Document, Object, ObjectId};
use crate::error::Result;
use crate::layout::{PageGeometry, LETTER};

/// Page trees deeper than this are treated as malformed (or cyclic)
const MAX_TREE_DEPTH: usize = 64;

/// Get a page's dictionary
pub(crate) fn page_dictionary(doc: &Document, page_id: ObjectId) -> Result<&Dictionary> {
    Ok(doc.get_object(page_id)?.as_dict()?)
}

/// Follow a single indirect reference
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object> {
    match object {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Look up a page attribute, walking up the page tree for inheritable keys
/// (`Resources`, `MediaBox`, `CropBox`, `Rotate`)
pub(crate) fn inherited_attribute(
    doc: &Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<Object>> {
    let mut node_id = page_id;

    for _ in 0..MAX_TREE_DEPTH {
        let node = page_dictionary(doc, node_id)?;

        if let Ok(value) = node.get(key) {
            return Ok(Some(resolve(doc, value)?.clone()));
        }

        match node.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => node_id = *parent_id,
            _ => return Ok(None),
        }
    }

    Ok(None)
}

fn as_number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

/// Parse a `[llx lly urx ury]` rectangle
fn as_page_box(object: &Object) -> Option<[f32; 4]> {
    let Object::Array(items) = object else {
        return None;
    };
    if items.len() != 4 {
        return None;
    }

    let mut values = [0.0; 4];
    for (slot, item) in values.iter_mut().zip(items) {
        *slot = as_number(item)?;
    }
    Some(values)
}

/// Visible box and rotation of a page
///
/// Uses the CropBox when present, otherwise the MediaBox, otherwise US Letter.
pub(crate) fn page_geometry(doc: &Document, page_id: ObjectId) -> Result<PageGeometry> {
    let crop_box = inherited_attribute(doc, page_id, b"CropBox")?
        .as_ref()
        .and_then(as_page_box);
    let media_box = inherited_attribute(doc, page_id, b"MediaBox")?
        .as_ref()
        .and_then(as_page_box);

    let rotate = match inherited_attribute(doc, page_id, b"Rotate")? {
        Some(Object::Integer(value)) => value,
        _ => 0,
    };
    if rotate % 90 != 0 {
        log::warn!("Ignoring /Rotate {} on page object {:?}", rotate, page_id);
    }

    Ok(PageGeometry::new(crop_box.or(media_box).unwrap_or(LETTER), rotate))
}

/// Pick a resource name not already used in a resource subdictionary
fn unused_name(dict: &Dictionary, prefix: &str) -> String {
    let mut index = 1;
    loop {
        let name = format!("{}{}", prefix, index);
        if !dict.has(name.as_bytes()) {
            return name;
        }
        index += 1;
    }
}

/// Add an XObject reference to a page's Resources dictionary
///
/// The resulting Resources dictionary is stored directly on the page (not as a
/// reference) so pages sharing or inheriting the original are left untouched.
/// Returns the resource name the XObject was registered under.
pub(crate) fn add_xobject_to_page_resources(
    doc: &mut Document,
    page_id: ObjectId,
    xobject_id: ObjectId,
) -> Result<String> {
    let mut resources = match inherited_attribute(doc, page_id, b"Resources")? {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };

    let mut xobjects = match resources.get(b"XObject") {
        Ok(object) => match resolve(doc, object)? {
            Object::Dictionary(dict) => dict.clone(),
            _ => Dictionary::new(),
        },
        Err(_) => Dictionary::new(),
    };

    let name = unused_name(&xobjects, "Sig");
    xobjects.set(name.clone(), Object::Reference(xobject_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    if let Object::Dictionary(ref mut page_dict) = doc.get_object_mut(page_id)? {
        page_dict.set("Resources", Object::Dictionary(resources));
    }

    Ok(name)
}

/// Content stream references of a page, flattening an indirect array
fn content_refs(doc: &Document, page_dict: &Dictionary) -> Vec<Object> {
    match page_dict.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => vec![],
    }
}

fn set_page_contents(doc: &mut Document, page_id: ObjectId, contents: Vec<Object>) -> Result<()> {
    if let Object::Dictionary(ref mut page_dict) = doc.get_object_mut(page_id)? {
        page_dict.set("Contents", Object::Array(contents));
    }
    Ok(())
}

/// Prepend a content stream to a page's Contents
pub(crate) fn prepend_content_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    new_content_id: ObjectId,
) -> Result<()> {
    let mut contents = content_refs(doc, page_dictionary(doc, page_id)?);
    contents.insert(0, Object::Reference(new_content_id));
    set_page_contents(doc, page_id, contents)
}

/// Append a content stream to a page's Contents
///
/// Appended content is drawn after the original content, so it lands on top
/// of any background fills.
pub(crate) fn append_content_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    new_content_id: ObjectId,
) -> Result<()> {
    let mut contents = content_refs(doc, page_dictionary(doc, page_id)?);
    contents.push(Object::Reference(new_content_id));
    set_page_contents(doc, page_id, contents)
}
