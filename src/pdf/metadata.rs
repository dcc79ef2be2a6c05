//! PDF metadata extraction

use std::collections::BTreeSet;
use std::path::Path;

use lopdf::{Document, Object};
use serde::Serialize;

use super::document::{page_image_ids, resolve};
use crate::error::{Error, Result};

/// Count pages by reading the Count field from the Pages dictionary
/// This is more reliable than get_pages() which doesn't handle nested page trees
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let catalog = doc
        .trailer
        .get(b"Root")
        .map(|root| resolve(doc, root))
        .map_err(|_| Error::General("No Root in trailer".to_string()))?;

    let Object::Dictionary(catalog) = catalog else {
        return Err(Error::General("Catalog is not a dictionary".to_string()));
    };

    let pages = catalog
        .get(b"Pages")
        .map(|pages| resolve(doc, pages))
        .map_err(|_| Error::General("No Pages in catalog".to_string()))?;

    let Object::Dictionary(pages) = pages else {
        return Err(Error::General("Pages is not a dictionary".to_string()));
    };

    match pages.get(b"Count") {
        Ok(Object::Integer(n)) if *n >= 0 => Ok(*n as usize),
        Ok(_) => Err(Error::General("Count is not an integer".to_string())),
        Err(_) => Err(Error::General("No Count in Pages".to_string())),
    }
}

/// PDF metadata
#[derive(Debug, Clone, Serialize)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Distinct image XObjects referenced from page resources
    pub image_count: usize,
}

fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info = doc.trailer.get(b"Info").ok().map(|i| resolve(doc, i))?;
    let Object::Dictionary(info) = info else {
        return None;
    };
    match info.get(key).ok().map(|v| resolve(doc, v))? {
        Object::String(bytes, _) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Extract metadata from a parsed document
pub fn metadata_of(doc: &Document) -> Result<PdfMetadata> {
    let page_count = count_pages_from_catalog(doc)?;

    let image_ids: BTreeSet<_> = doc
        .get_pages()
        .into_values()
        .flat_map(|page_id| page_image_ids(doc, page_id))
        .collect();

    Ok(PdfMetadata {
        page_count,
        title: info_string(doc, b"Title"),
        author: info_string(doc, b"Author"),
        image_count: image_ids.len(),
    })
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    let doc = load(path)?;
    let metadata = metadata_of(&doc)?;

    if metadata.page_count == 0 {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }
    Ok(metadata)
}

/// Count the number of pages in a PDF file
///
/// This is a quick operation that reads the Count field from the Pages dictionary.
pub fn count_pages(path: &Path) -> Result<usize> {
    let doc = load(path)?;
    let page_count = count_pages_from_catalog(&doc)?;

    if page_count == 0 {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    Ok(page_count)
}

fn load(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    Document::load(path).map_err(|source| Error::DocumentLoad {
        path: path.to_path_buf(),
        source,
    })
}
