//! PDF Signer Library
//!
//! A cross-platform library for placing a signature image on PDF pages.
//! This library provides functionality to:
//! - Parse page selections (`all`, `2-5`, `1,3,5`)
//! - Load PNG/JPEG signatures and embed them as image XObjects
//! - Stamp the signature at a fixed rectangle on each selected page
//! - Inspect page counts and sizes for choosing coordinates
//!
//! # Example
//!
//! ```no_run
//! use pdf_signer::layout::Rect;
//! use pdf_signer::pdf::{stamp, StampRequest};
//! use pdf_signer::PageSelector;
//!
//! let mut request = StampRequest::new(
//!     "contract.pdf",
//!     "signature.png",
//!     Rect::new(100.0, 100.0, 50.0, 50.0),
//! );
//! request.selector = PageSelector::Range(2, 3);
//!
//! stamp(&request).expect("Failed to sign PDF");
//! ```

pub mod error;
pub mod layout;
pub mod pdf;
pub mod selector;

// Re-export commonly used items
pub use error::{Error, Result};
pub use selector::PageSelector;
