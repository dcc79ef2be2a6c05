//! Output path construction for untrusted image names

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Extension written for every exported image
pub const EXTENSION: &str = "png";

/// Join `dest` and `<stem>.png`, rejecting stems that could leave `dest`
///
/// Image names come from document content. A stem is rejected when it is
/// empty, `.` or `..`, or contains a path separator, a drive separator, or a
/// control character.
pub fn output_path(dest: &Path, stem: &str) -> Result<PathBuf> {
    if !is_safe_stem(stem) {
        return Err(Error::UnsafeName(stem.to_string()));
    }

    let file_name = format!("{}.{}", stem, EXTENSION);
    let relative = Path::new(&file_name);

    // Exactly one normal component below dest
    let mut components = relative.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(dest.join(relative)),
        _ => Err(Error::UnsafeName(stem.to_string())),
    }
}

fn is_safe_stem(stem: &str) -> bool {
    if stem.is_empty() || stem == "." || stem == ".." {
        return false;
    }
    !stem
        .chars()
        .any(|c| c == '/' || c == '\\' || c == ':' || c.is_control())
}
