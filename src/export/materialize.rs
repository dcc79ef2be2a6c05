//! Turning a raw image object into a PNG file and an export record

use std::io::Write;
use std::path::{Path, PathBuf};

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};
use crate::export::path::output_path;
use crate::source::{ImageKind, RawImage};

/// Interleaved channel layouts the exporter can encode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelLayout {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl ChannelLayout {
    /// Layout for a channel count, if it is one of 1 through 4
    pub fn from_count(channels: u64) -> Option<Self> {
        match channels {
            1 => Some(ChannelLayout::Gray),
            2 => Some(ChannelLayout::GrayAlpha),
            3 => Some(ChannelLayout::Rgb),
            4 => Some(ChannelLayout::Rgba),
            _ => None,
        }
    }

    /// Number of interleaved channels
    pub fn channels(self) -> u8 {
        match self {
            ChannelLayout::Gray => 1,
            ChannelLayout::GrayAlpha => 2,
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }

    fn color_type(self, bits: u8) -> ExtendedColorType {
        match (self, bits) {
            (ChannelLayout::Gray, 16) => ExtendedColorType::L16,
            (ChannelLayout::GrayAlpha, 16) => ExtendedColorType::La16,
            (ChannelLayout::Rgb, 16) => ExtendedColorType::Rgb16,
            (ChannelLayout::Rgba, 16) => ExtendedColorType::Rgba16,
            (ChannelLayout::Gray, _) => ExtendedColorType::L8,
            (ChannelLayout::GrayAlpha, _) => ExtendedColorType::La8,
            (ChannelLayout::Rgb, _) => ExtendedColorType::Rgb8,
            (ChannelLayout::Rgba, _) => ExtendedColorType::Rgba8,
        }
    }
}

/// Infer the channel layout of `image` from its buffer length
///
/// `bytes = width * height * channels * (bits / 8)` must hold exactly for a
/// channel count between 1 and 4.
pub fn infer_layout(name: &str, image: &RawImage) -> Result<ChannelLayout> {
    if image.width == 0 || image.height == 0 {
        return Err(Error::InvalidDimensions {
            name: name.to_string(),
            width: image.width,
            height: image.height,
        });
    }

    let sample_bytes: u64 = match image.bits_per_component {
        8 => 1,
        16 => 2,
        bits => {
            return Err(Error::UnsupportedBitDepth {
                name: name.to_string(),
                bits,
            })
        }
    };

    let pixel_bytes = u64::from(image.width)
        .checked_mul(u64::from(image.height))
        .and_then(|pixels| pixels.checked_mul(sample_bytes))
        .ok_or_else(|| Error::InvalidDimensions {
            name: name.to_string(),
            width: image.width,
            height: image.height,
        })?;
    let len = image.data.len() as u64;

    if len % pixel_bytes != 0 {
        return Err(Error::InvalidChannelCount {
            name: name.to_string(),
            channels: len as f64 / pixel_bytes as f64,
        });
    }

    let channels = len / pixel_bytes;
    ChannelLayout::from_count(channels).ok_or_else(|| Error::InvalidChannelCount {
        name: name.to_string(),
        channels: channels as f64,
    })
}

/// Description of one exported image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRecord {
    pub name: String,
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    /// Length of the raw sample buffer
    pub bytes: usize,
    pub file: PathBuf,
}

/// Options for writing a single image
#[derive(Debug, Clone)]
pub struct MaterializeOptions {
    /// Replace an existing file at the target path
    pub overwrite: bool,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self { overwrite: true }
    }
}

/// Write `image` to `dest/<name>.png` and describe the result
pub fn materialize(name: &str, image: &RawImage, dest: &Path) -> Result<ExportRecord> {
    materialize_with(name, name, image, dest, &MaterializeOptions::default())
}

/// Write `image` to `dest/<stem>.png`, recording it under `name`
pub fn materialize_with(
    name: &str,
    stem: &str,
    image: &RawImage,
    dest: &Path,
    options: &MaterializeOptions,
) -> Result<ExportRecord> {
    let layout = infer_layout(name, image)?;
    let path = output_path(dest, stem)?;

    let png = encode_png(name, image, layout)?;
    write_atomically(&path, &png, options.overwrite)?;

    debug!(
        name,
        width = image.width,
        height = image.height,
        channels = layout.channels(),
        file = %path.display(),
        "wrote image"
    );

    Ok(ExportRecord {
        name: name.to_string(),
        kind: image.kind,
        width: image.width,
        height: image.height,
        channels: layout.channels(),
        bytes: image.data.len(),
        file: path,
    })
}

/// Losslessly encode the samples as PNG into memory
fn encode_png(name: &str, image: &RawImage, layout: ChannelLayout) -> Result<Vec<u8>> {
    // PDF stores 16-bit samples big-endian; the encoder takes native order
    let native;
    let samples: &[u8] = if image.bits_per_component == 16 {
        native = image
            .data
            .chunks_exact(2)
            .flat_map(|pair| u16::from_be_bytes([pair[0], pair[1]]).to_ne_bytes())
            .collect::<Vec<u8>>();
        &native
    } else {
        &image.data
    };

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(
            samples,
            image.width,
            image.height,
            layout.color_type(image.bits_per_component),
        )
        .map_err(|source| Error::Encode {
            name: name.to_string(),
            source,
        })?;
    Ok(png)
}

/// Write through a temporary file in the same directory, then rename
fn write_atomically(path: &Path, bytes: &[u8], overwrite: bool) -> Result<()> {
    let write_err = |source: std::io::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(bytes).map_err(write_err)?;
    file.as_file().sync_all().map_err(write_err)?;

    let persisted = if overwrite {
        file.persist(path)
    } else {
        file.persist_noclobber(path)
    };
    persisted.map_err(|e| write_err(e.error))?;
    Ok(())
}
