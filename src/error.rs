//! Error types for the PDF image export library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF image export library
#[derive(Error, Debug)]
pub enum Error {
    /// The document could not be opened or parsed
    #[error("Failed to load PDF {}: {source}", .path.display())]
    DocumentLoad {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    /// A page's operator stream could not be retrieved
    #[error("Failed to read page {page}: {reason}")]
    PageRead { page: u32, reason: String },

    /// Buffer length does not match any supported channel layout
    #[error("Invalid image channel count {channels} for image {name}")]
    InvalidChannelCount { name: String, channels: f64 },

    /// Width or height is zero
    #[error("Invalid dimensions {width}x{height} for image {name}")]
    InvalidDimensions { name: String, width: u32, height: u32 },

    /// Sample depth other than 8 or 16 bits
    #[error("Unsupported bit depth {bits} for image {name}")]
    UnsupportedBitDepth { name: String, bits: u8 },

    /// PNG encoding failed
    #[error("Failed to encode image {name}: {source}")]
    Encode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    /// Writing the output file failed
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating the destination directory failed
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image name would escape the destination directory
    #[error("Unsafe image name: {0:?}")]
    UnsafeName(String),

    /// Image object found but its samples could not be decoded
    #[error("Failed to decode image {name}: {reason}")]
    ImageDecode { name: String, reason: String },

    /// Image uses an encoding this library does not decode
    #[error("Unsupported image {name}: {reason}")]
    UnsupportedImage { name: String, reason: String },

    /// A per-image failure, with the page it was discovered on
    #[error("Page {page}, image {name}: {source}")]
    Image {
        page: u32,
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// The walk was cancelled by the caller
    #[error("Export cancelled")]
    Cancelled,

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// The innermost error, looking through [`Error::Image`] wrappers
    pub fn root(&self) -> &Error {
        match self {
            Error::Image { source, .. } => source.root(),
            other => other,
        }
    }
}
