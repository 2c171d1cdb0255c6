//! Signature stamping using lopdf
//!
//! Loads a PDF, embeds the signature image once, and draws it on each selected
//! page at the requested rectangle. Pages that are not selected are left
//! exactly as they were. Nothing is written until every page has been
//! processed, and the output is replaced atomically.

use std::fs::{self, Permissions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use lopdf::{Dictionary, Document, ObjectId, Stream};
use tempfile::NamedTempFile;
use crate::error::{Error, Result};
use crate::layout::{ImageFit, PageGeometry, Rect};
use crate::selector::PageSelector;
use super::signature::SignatureImage;
use super::page::{
    add_xobject_to_page_resources, append_content_to_page, page_geometry,
    prepend_content_to_page,
};

/// Everything needed to sign one document
#[derive(Debug, Clone)]
pub struct StampRequest {
    /// Source PDF
    pub source: PathBuf,
    /// Signature image (PNG or JPEG)
    pub image: PathBuf,
    /// Where the image goes on each selected page
    pub rect: Rect,
    /// Which pages receive the image
    pub selector: PageSelector,
    /// Output PDF; derived from `source` when not given
    pub output: Option<PathBuf>,
    /// How the image fills `rect`
    pub fit: ImageFit,
}

impl StampRequest {
    /// A request stamping every page, written next to the source
    pub fn new(source: impl Into<PathBuf>, image: impl Into<PathBuf>, rect: Rect) -> Self {
        Self {
            source: source.into(),
            image: image.into(),
            rect,
            selector: PageSelector::All,
            output: None,
            fit: ImageFit::default(),
        }
    }

    /// The path the signed document will be written to
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.source))
    }
}

/// Insert `_signed` before the extension: `contract.pdf` → `contract_signed.pdf`
pub fn default_output_path(source: &Path) -> PathBuf {
    let mut name = source.file_stem().unwrap_or_default().to_os_string();
    name.push("_signed");
    if let Some(extension) = source.extension() {
        name.push(".");
        name.push(extension);
    }
    source.with_file_name(name)
}

/// Outcome of a successful stamp
#[derive(Debug, Clone, PartialEq)]
pub struct StampReport {
    /// Where the signed document was saved
    pub output: PathBuf,
    /// Number of pages in the document
    pub page_count: u32,
    /// 1-based numbers of the pages that received the image
    pub stamped_pages: Vec<u32>,
}

/// Stamp a signature image onto the selected pages of a PDF
///
/// # Example
///
/// ```no_run
/// use pdf_signer::layout::Rect;
/// use pdf_signer::pdf::{stamp, StampRequest};
///
/// let mut request = StampRequest::new("contract.pdf", "signature.png", Rect::new(100.0, 650.0, 150.0, 50.0));
/// request.selector = "2-3".parse().expect("valid selection");
///
/// let report = stamp(&request).expect("Failed to sign PDF");
/// println!("Signed PDF saved as {}", report.output.display());
/// ```
pub fn stamp(request: &StampRequest) -> Result<StampReport> {
    check_rect(&request.rect)?;
    let doc = load_document(&request.source)?;
    let image = SignatureImage::open(&request.image)?;
    stamp_document(doc, request, &image)
}

/// Like [`stamp`], but with an image that has already been decoded
///
/// `request.image` is not read; the same [`SignatureImage`] can be reused for
/// any number of documents.
pub fn stamp_with_image(request: &StampRequest, image: &SignatureImage) -> Result<StampReport> {
    check_rect(&request.rect)?;
    let doc = load_document(&request.source)?;
    stamp_document(doc, request, image)
}

fn check_rect(rect: &Rect) -> Result<()> {
    if rect.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidRect(format!(
            "x={}, y={}, width={}, height={}",
            rect.x, rect.y, rect.width, rect.height
        )))
    }
}

/// Load a PDF, reporting failures as [`Error::DocumentOpen`]
pub(crate) fn load_document(path: &Path) -> Result<Document> {
    Document::load(path).map_err(|source| Error::DocumentOpen {
        path: path.to_path_buf(),
        source,
    })
}

fn stamp_document(
    mut doc: Document,
    request: &StampRequest,
    image: &SignatureImage,
) -> Result<StampReport> {
    let output = request.output_path();
    let permissions = fs::metadata(&request.source)
        .map(|metadata| metadata.permissions())
        .ok();

    let pages = doc.get_pages();
    let page_count = pages.len() as u32;
    let selected: Vec<(u32, ObjectId)> = pages
        .into_iter()
        .filter(|(page_number, _)| request.selector.includes(*page_number))
        .collect();

    let rect = match request.fit {
        ImageFit::Stretch => request.rect,
        ImageFit::Contain => {
            let (width, height) = image.dimensions();
            request.rect.fit_within(width, height)
        }
    };

    let mut stamped_pages = Vec::with_capacity(selected.len());

    // An empty selection must not add anything, not even an unused image
    if !selected.is_empty() {
        let image_id = image.embed(&mut doc);

        for (page_number, page_id) in selected {
            let geometry = page_geometry(&doc, page_id)?;
            stamp_page(&mut doc, page_id, image_id, &geometry, &rect)?;

            log::debug!(
                "Stamped page {} at {:?} (rotation {})",
                page_number,
                rect,
                geometry.rotation
            );
            stamped_pages.push(page_number);
        }
    }

    save_document(&mut doc, &output, permissions)?;

    log::info!(
        "Stamped {} of {} pages, saved {}",
        stamped_pages.len(),
        page_count,
        output.display()
    );

    Ok(StampReport {
        output,
        page_count,
        stamped_pages,
    })
}

/// Draw the image XObject on one page
///
/// The original content is wrapped in q/Q so a transformation it leaves
/// behind cannot move or scale the signature.
fn stamp_page(
    doc: &mut Document,
    page_id: ObjectId,
    image_id: ObjectId,
    geometry: &PageGeometry,
    rect: &Rect,
) -> Result<()> {
    let matrix = geometry.image_matrix(rect);
    if !matrix.is_finite() {
        return Err(Error::InvalidRect(format!("{:?} overflows on this page", rect)));
    }

    let name = add_xobject_to_page_resources(doc, page_id, image_id)?;

    let save_state_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    prepend_content_to_page(doc, page_id, save_state_id)?;

    let content = format!(
        "\nQ\nq\n{}\n/{} Do\nQ\n",
        matrix.to_cm_operator(),
        name
    );
    let stamp_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
    append_content_to_page(doc, page_id, stamp_id)?;

    Ok(())
}

/// Write the document to a temporary file beside `output`, then move it into place
///
/// The temporary file is removed on every failure path, so a failed save
/// never leaves a partial PDF behind. The output takes `permissions` (those of
/// the source) instead of the owner-only mode temporary files are created with.
fn save_document(doc: &mut Document, output: &Path, permissions: Option<Permissions>) -> Result<()> {
    let save_error = |source| Error::Save {
        path: output.to_path_buf(),
        source,
    };

    let directory = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(directory).map_err(save_error)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        doc.save_to(&mut writer)
            .map_err(|e| save_error(std::io::Error::other(e.to_string())))?;
        writer.flush().map_err(save_error)?;
    }

    if let Some(permissions) = permissions {
        temp.as_file().set_permissions(permissions).map_err(save_error)?;
    }

    temp.persist(output).map_err(|e| save_error(e.error))?;
    Ok(())
}
