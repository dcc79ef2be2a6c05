//! PDF access through lopdf

pub mod document;
pub mod filters;
pub mod metadata;
pub mod xobject;

// Re-export commonly used items
pub use document::{LopdfDocument, LopdfPage};
pub use metadata::{count_pages, extract_metadata, metadata_of, PdfMetadata};
