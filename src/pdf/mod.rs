//! PDF manipulation module

pub mod signature;
pub mod metadata;
mod page;
pub mod stamp;

// Re-export commonly used items
pub use signature::SignatureImage;
pub use metadata::{count_pages, extract_metadata, inspect_pages, PageInfo, PdfMetadata};
pub use stamp::{default_output_path, stamp, stamp_with_image, StampReport, StampRequest};
