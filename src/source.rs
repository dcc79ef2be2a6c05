//! The interface between the exporter and whatever parses the PDF
//!
//! The exporter never touches PDF objects directly. It sees a document as a
//! numbered list of pages, each page as a compiled operator stream plus two
//! name tables (page-local and shared) that resolve image names to raw
//! sample buffers.

use serde::Serialize;
use std::fmt;

use crate::error::Result;

/// A document that can hand out pages by 1-based number
pub trait PdfSource {
    /// Page handle, valid while the document is borrowed
    type Page<'a>: PageSource
    where
        Self: 'a;

    /// Number of pages in the document
    fn page_count(&self) -> u32;

    /// Load page `number` (1-based) and compile its operator stream
    ///
    /// Fails with [`crate::Error::PageRead`] when the page or its content
    /// cannot be read.
    fn page(&self, number: u32) -> Result<Self::Page<'_>>;
}

/// One page's operator stream and image tables
pub trait PageSource {
    /// Operations in drawing order
    fn operations(&self) -> &[Operation];

    /// Resolve an image name in one scope
    ///
    /// `Ok(None)` means the name is not present in that scope.
    fn lookup(&self, scope: Scope, name: &str) -> Result<Option<RawImage>>;

    /// Whether `name` is present in `scope`, without decoding it
    fn contains(&self, scope: Scope, name: &str) -> bool;
}

impl<T: PageSource + ?Sized> PageSource for &T {
    fn operations(&self) -> &[Operation] {
        (**self).operations()
    }

    fn lookup(&self, scope: Scope, name: &str) -> Result<Option<RawImage>> {
        (**self).lookup(scope, name)
    }

    fn contains(&self, scope: Scope, name: &str) -> bool {
        (**self).contains(scope, name)
    }
}

/// Which name table an image was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Objects visible only from the current page
    PageLocal,
    /// Objects shared across pages
    Shared,
}

impl Scope {
    /// Resolution order: page-local first, then shared
    pub const ORDER: [Scope; 2] = [Scope::PageLocal, Scope::Shared];
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::PageLocal => f.write_str("page_local"),
            Scope::Shared => f.write_str("shared"),
        }
    }
}

/// Operation codes the exporter distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// `Do` on an image XObject
    PaintImageXObject,
    /// `BI ... ID ... EI`
    PaintInlineImageXObject,
    /// `Do` on a form XObject; the form's operations follow inline
    PaintFormXObject,
    /// Anything else
    Other,
}

impl OpCode {
    /// True for the two operations that paint an image
    pub fn paints_image(self) -> bool {
        matches!(self, OpCode::PaintImageXObject | OpCode::PaintInlineImageXObject)
    }
}

/// Operand of a compiled operation
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Name(String),
    Number(f64),
    Other,
}

/// A single entry of a page's operator stream
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub code: OpCode,
    /// Operator as written in the content stream (`Do`, `BI`, `cm`, ...)
    pub operator: String,
    pub operands: Vec<Operand>,
}

impl Operation {
    /// Build an image-painting operation for `name`
    pub fn paint(code: OpCode, operator: &str, name: impl Into<String>) -> Self {
        Self {
            code,
            operator: operator.to_string(),
            operands: vec![Operand::Name(name.into())],
        }
    }

    /// First operand, when it is a name
    pub fn image_name(&self) -> Option<&str> {
        match self.operands.first() {
            Some(Operand::Name(name)) => Some(name),
            _ => None,
        }
    }
}

/// Colour space of an image, kept as metadata only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    Grayscale,
    Rgb,
    Cmyk,
    Indexed,
    Lab,
    IccBased,
    Separation,
    DeviceN,
    StencilMask,
    Unknown,
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImageKind::Grayscale => "grayscale",
            ImageKind::Rgb => "rgb",
            ImageKind::Cmyk => "cmyk",
            ImageKind::Indexed => "indexed",
            ImageKind::Lab => "lab",
            ImageKind::IccBased => "icc_based",
            ImageKind::Separation => "separation",
            ImageKind::DeviceN => "device_n",
            ImageKind::StencilMask => "stencil_mask",
            ImageKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A resolved image: dimensions plus tightly packed, row-major samples
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    /// 8 or 16; 16-bit samples are big-endian
    pub bits_per_component: u8,
    pub kind: ImageKind,
    pub data: Vec<u8>,
}

impl RawImage {
    /// An 8-bit image
    pub fn new(width: u32, height: u32, kind: ImageKind, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            bits_per_component: 8,
            kind,
            data,
        }
    }
}
