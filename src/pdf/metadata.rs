//! PDF metadata extraction

use std::path::Path;
use lopdf::{Document, Object};
use crate::error::{Error, Result};
use crate::layout::PageGeometry;
use super::page::page_geometry;
use super::stamp::load_document;

/// Count pages by reading the Count field from the Pages dictionary
/// This is more reliable than get_pages() which doesn't handle nested page trees
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let catalog = doc.catalog()
        .map_err(|_| Error::General("No document catalog".to_string()))?;

    let pages_id = match catalog.get(b"Pages") {
        Ok(Object::Reference(id)) => *id,
        _ => return Err(Error::General("Pages is not a reference".to_string())),
    };

    let pages_dict = match doc.get_object(pages_id)? {
        Object::Dictionary(dict) => dict,
        _ => return Err(Error::General("Pages is not a dictionary".to_string())),
    };

    match pages_dict.get(b"Count") {
        Ok(Object::Integer(n)) => Ok(*n as usize),
        _ => Err(Error::General("Count is not an integer".to_string())),
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise single-byte)
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
}

/// Visible size and rotation of one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageInfo {
    /// 1-based page number
    pub number: u32,
    pub geometry: PageGeometry,
}

impl PageInfo {
    /// Width and height in points as displayed (after rotation)
    pub fn visible_size(&self) -> (f32, f32) {
        self.geometry.visible_size()
    }
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    let doc = load_document(path)?;

    // Use catalog-based counting for accuracy
    let page_count = count_pages_from_catalog(&doc)?;

    let info_string = |key: &[u8]| -> Option<String> {
        let info_id = doc.trailer.get(b"Info").ok()?.as_reference().ok()?;
        let info_dict = doc.get_object(info_id).ok()?.as_dict().ok()?;
        let bytes = info_dict.get(key).ok()?.as_str().ok()?;
        Some(decode_text_string(bytes))
    };

    Ok(PdfMetadata {
        page_count,
        title: info_string(b"Title"),
        author: info_string(b"Author"),
    })
}

/// Count the number of pages in a PDF file
///
/// This is a quick operation that reads the Count field from the Pages dictionary.
pub fn count_pages(path: &Path) -> Result<usize> {
    let doc = load_document(path)?;
    count_pages_from_catalog(&doc)
}

/// Describe every page: visible size and rotation
///
/// Useful for choosing signature coordinates, which are measured from the
/// top-left corner of the page as displayed.
pub fn inspect_pages(path: &Path) -> Result<Vec<PageInfo>> {
    let doc = load_document(path)?;

    doc.get_pages()
        .into_iter()
        .map(|(number, page_id)| {
            Ok(PageInfo {
                number,
                geometry: page_geometry(&doc, page_id)?,
            })
        })
        .collect()
}
