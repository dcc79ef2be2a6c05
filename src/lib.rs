//! PDF Image Export Library
//!
//! Extracts the raster images a PDF paints and writes each one as a PNG.
//! This library provides functionality to:
//! - Walk every page's content stream and find image-painting operations
//! - Resolve image names against page-local and shared resource tables
//! - Infer the channel layout of raw samples and encode them losslessly
//! - Extract document metadata (page counts, image counts, etc.)
//!
//! # Example
//!
//! ```no_run
//! use pdf_image_export::export::export_images;
//! use std::path::Path;
//!
//! let records = export_images(Path::new("paper.pdf"), Path::new("figures"))
//!     .expect("Failed to export images");
//! for record in &records {
//!     println!("{} {}x{} -> {}", record.name, record.width, record.height, record.file.display());
//! }
//! ```

pub mod error;
pub mod export;
pub mod pdf;
pub mod source;

// Re-export commonly used items
pub use error::{Error, Result};
pub use export::{export_images, export_images_with, ExportOptions, ExportRecord, ExportReport};
pub use source::{PageSource, PdfSource, RawImage, Scope};
