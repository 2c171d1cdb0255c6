//! Error types for the PDF signer library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF signer library
#[derive(Error, Debug)]
pub enum Error {
    /// Source document missing, unreadable, or not a valid PDF
    #[error("Cannot open PDF {}: {source}", path.display())]
    DocumentOpen {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    /// Signature image missing, unreadable, or in an unsupported format
    #[error("Cannot load signature image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Page selector text could not be parsed
    #[error("Invalid page selection: {0}")]
    InvalidPageSelector(String),

    /// Placement rectangle cannot be written to a content stream
    #[error("Invalid signature rectangle: {0}")]
    InvalidRect(String),

    /// Output could not be written
    #[error("Cannot save PDF to {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PDF processing error while modifying pages
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// General error
    #[error("{0}")]
    General(String),
}
