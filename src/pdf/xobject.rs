//! Decoding image XObjects and inline images into raw samples
//!
//! The output is always tightly packed, row-major and interleaved: 8-bit
//! samples (sub-byte depths and palettes are expanded) or 16-bit big-endian
//! samples when the image declares 16 bits per component.

use lopdf::{Dictionary, Document, Object, Stream};
use tracing::debug;
use zune_jpeg::zune_core::bytestream::ZCursor;
use zune_jpeg::zune_core::colorspace::ColorSpace as JpegColorSpace;
use zune_jpeg::zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

use super::document::resolve;
use super::filters::{self, canonical_filter};
use crate::error::{Error, Result};
use crate::source::{ImageKind, RawImage};

/// Nesting limit for colour space definitions
const MAX_COLOR_SPACE_DEPTH: usize = 4;

/// True when the stream is an image XObject
pub fn is_image(stream: &Stream) -> bool {
    matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Image")
}

/// True when the stream is a form XObject
pub fn is_form(stream: &Stream) -> bool {
    matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Form")
}

/// Expand the abbreviated keys and names used by inline images
pub fn expand_inline_dict(dict: &Dictionary) -> Dictionary {
    let mut expanded = Dictionary::new();
    for (key, value) in dict.iter() {
        let full_key: &[u8] = match key.as_slice() {
            b"BPC" => b"BitsPerComponent",
            b"CS" => b"ColorSpace",
            b"D" => b"Decode",
            b"DP" => b"DecodeParms",
            b"F" => b"Filter",
            b"H" => b"Height",
            b"IM" => b"ImageMask",
            b"I" => b"Interpolate",
            b"W" => b"Width",
            other => other,
        };
        let value = match full_key {
            b"ColorSpace" => expand_color_space_name(value),
            _ => value.clone(),
        };
        expanded.set(full_key.to_vec(), value);
    }
    expanded
}

fn expand_color_space_name(value: &Object) -> Object {
    let expand = |name: &[u8]| -> Vec<u8> {
        match name {
            b"G" => b"DeviceGray".to_vec(),
            b"RGB" => b"DeviceRGB".to_vec(),
            b"CMYK" => b"DeviceCMYK".to_vec(),
            b"I" => b"Indexed".to_vec(),
            other => other.to_vec(),
        }
    };
    match value {
        Object::Name(name) => Object::Name(expand(name)),
        Object::Array(items) => Object::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Object::Name(name) if i == 0 => Object::Name(expand(name)),
                    Object::Name(name) if i == 1 => Object::Name(expand(name)),
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Parsed colour space, reduced to what sample unpacking needs
#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    Lab,
    IccBased(usize),
    Separation,
    DeviceN(usize),
    Indexed {
        base: Box<ColorSpace>,
        hival: usize,
        lookup: Vec<u8>,
    },
    Unknown,
}

impl ColorSpace {
    fn components(&self) -> Option<usize> {
        match self {
            ColorSpace::Gray | ColorSpace::Separation => Some(1),
            ColorSpace::Rgb | ColorSpace::Lab => Some(3),
            ColorSpace::Cmyk => Some(4),
            ColorSpace::IccBased(n) | ColorSpace::DeviceN(n) => Some(*n),
            ColorSpace::Indexed { .. } => Some(1),
            ColorSpace::Unknown => None,
        }
    }

    fn kind(&self) -> ImageKind {
        match self {
            ColorSpace::Gray => ImageKind::Grayscale,
            ColorSpace::Rgb => ImageKind::Rgb,
            ColorSpace::Cmyk => ImageKind::Cmyk,
            ColorSpace::Lab => ImageKind::Lab,
            ColorSpace::IccBased(_) => ImageKind::IccBased,
            ColorSpace::Separation => ImageKind::Separation,
            ColorSpace::DeviceN(_) => ImageKind::DeviceN,
            ColorSpace::Indexed { .. } => ImageKind::Indexed,
            ColorSpace::Unknown => ImageKind::Unknown,
        }
    }
}

fn parse_color_space(doc: &Document, obj: &Object, depth: usize) -> std::result::Result<ColorSpace, String> {
    if depth > MAX_COLOR_SPACE_DEPTH {
        return Err("colour space nested too deeply".to_string());
    }

    match resolve(doc, obj) {
        Object::Name(name) => Ok(match name.as_slice() {
            b"DeviceGray" | b"CalGray" => ColorSpace::Gray,
            b"DeviceRGB" | b"CalRGB" => ColorSpace::Rgb,
            b"DeviceCMYK" => ColorSpace::Cmyk,
            b"Lab" => ColorSpace::Lab,
            _ => ColorSpace::Unknown,
        }),
        Object::Array(items) => {
            let family = match items.first().map(|o| resolve(doc, o)) {
                Some(Object::Name(name)) => name.as_slice(),
                _ => return Ok(ColorSpace::Unknown),
            };
            match family {
                b"DeviceGray" | b"CalGray" => Ok(ColorSpace::Gray),
                b"DeviceRGB" | b"CalRGB" => Ok(ColorSpace::Rgb),
                b"DeviceCMYK" => Ok(ColorSpace::Cmyk),
                b"Lab" => Ok(ColorSpace::Lab),
                b"ICCBased" => {
                    let n = items
                        .get(1)
                        .map(|o| resolve(doc, o))
                        .and_then(|o| match o {
                            Object::Stream(s) => s.dict.get(b"N").ok().and_then(number),
                            _ => None,
                        })
                        .map(|n| n as usize)
                        .unwrap_or(3);
                    Ok(ColorSpace::IccBased(n))
                }
                b"Separation" => Ok(ColorSpace::Separation),
                b"DeviceN" => {
                    let n = match items.get(1).map(|o| resolve(doc, o)) {
                        Some(Object::Array(names)) => names.len(),
                        _ => 1,
                    };
                    Ok(ColorSpace::DeviceN(n))
                }
                b"Indexed" => {
                    let base = items
                        .get(1)
                        .ok_or("indexed colour space without base")?;
                    let base = parse_color_space(doc, base, depth + 1)?;
                    let hival = items
                        .get(2)
                        .map(|o| resolve(doc, o))
                        .and_then(number)
                        .ok_or("indexed colour space without hival")?
                        .clamp(0.0, 255.0) as usize;
                    let lookup = match items.get(3).map(|o| resolve(doc, o)) {
                        Some(Object::String(bytes, _)) => bytes.clone(),
                        Some(Object::Stream(stream)) => decode_filters(doc, stream)?,
                        _ => return Err("indexed colour space without lookup table".to_string()),
                    };
                    Ok(ColorSpace::Indexed {
                        base: Box::new(base),
                        hival,
                        lookup,
                    })
                }
                _ => Ok(ColorSpace::Unknown),
            }
        }
        _ => Ok(ColorSpace::Unknown),
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(n) => Some(*n as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .ok()
        .and_then(number)
        .filter(|n| *n >= 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32)
}

/// Filter names in application order
fn filter_names(doc: &Document, dict: &Dictionary) -> Vec<String> {
    let name_of = |o: &Object| match resolve(doc, o) {
        Object::Name(n) => Some(canonical_filter(&String::from_utf8_lossy(n)).to_string()),
        _ => None,
    };
    match dict.get(b"Filter").map(|o| resolve(doc, o)) {
        Ok(Object::Array(items)) => items.iter().filter_map(name_of).collect(),
        Ok(other) => name_of(other).into_iter().collect(),
        Err(_) => Vec::new(),
    }
}

/// Decode parameters for the filter at `index`
fn filter_params<'a>(doc: &'a Document, dict: &'a Dictionary, index: usize) -> Option<&'a Dictionary> {
    match dict.get(b"DecodeParms").ok().map(|o| resolve(doc, o))? {
        Object::Dictionary(params) => Some(params),
        Object::Array(items) => match items.get(index).map(|o| resolve(doc, o)) {
            Some(Object::Dictionary(params)) => Some(params),
            _ => None,
        },
        _ => None,
    }
}

/// Apply every general-purpose filter of `stream`
pub fn decode_filters(doc: &Document, stream: &Stream) -> std::result::Result<Vec<u8>, String> {
    let mut data = stream.content.clone();
    for (i, filter) in filter_names(doc, &stream.dict).iter().enumerate() {
        data = filters::decode(&data, filter, filter_params(doc, &stream.dict, i))?;
    }
    Ok(data)
}

/// Decode an image stream into raw samples, with its `/SMask` as alpha
pub fn decode_image(doc: &Document, stream: &Stream, name: &str) -> Result<RawImage> {
    let image = decode_samples(doc, stream, name)?;
    Ok(apply_soft_mask(doc, &stream.dict, name, image))
}

/// Decode an image stream without looking at `/SMask`
fn decode_samples(doc: &Document, stream: &Stream, name: &str) -> Result<RawImage> {
    let decode_err = |reason: String| Error::ImageDecode {
        name: name.to_string(),
        reason,
    };

    let dict = &stream.dict;
    let width = dimension(dict, b"Width").ok_or_else(|| decode_err("missing /Width".to_string()))?;
    let height = dimension(dict, b"Height").ok_or_else(|| decode_err("missing /Height".to_string()))?;

    let image_mask = matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
    let color_space = if image_mask {
        ColorSpace::Gray
    } else {
        match dict.get(b"ColorSpace") {
            Ok(cs) => parse_color_space(doc, cs, 0).map_err(decode_err)?,
            Err(_) => ColorSpace::Unknown,
        }
    };
    let kind = if image_mask {
        ImageKind::StencilMask
    } else {
        color_space.kind()
    };

    let filters = filter_names(doc, dict);
    let (codec_filters, codec) = match filters.last().map(String::as_str) {
        Some(last @ ("DCTDecode" | "JPXDecode" | "JBIG2Decode" | "CCITTFaxDecode")) => {
            (&filters[..filters.len() - 1], Some(last))
        }
        _ => (&filters[..], None),
    };

    let mut data = stream.content.clone();
    for (i, filter) in codec_filters.iter().enumerate() {
        data = filters::decode(&data, filter, filter_params(doc, dict, i)).map_err(decode_err)?;
    }

    match codec {
        Some("DCTDecode") => decode_jpeg(name, &data, &color_space, kind),
        Some(other) => Err(Error::UnsupportedImage {
            name: name.to_string(),
            reason: format!("{} images are not decoded", other),
        }),
        None => {
            let bpc = if image_mask {
                1
            } else {
                dict.get(b"BitsPerComponent")
                    .ok()
                    .and_then(number)
                    .map(|n| n as u8)
                    .unwrap_or(8)
            };
            let invert = image_mask && decode_is_inverted(dict);
            let samples = unpack(name, &data, width, height, &color_space, bpc, invert)?;
            Ok(RawImage {
                width,
                height,
                bits_per_component: if bpc == 16 { 16 } else { 8 },
                kind,
                data: samples,
            })
        }
    }
}

fn decode_is_inverted(dict: &Dictionary) -> bool {
    match dict.get(b"Decode") {
        Ok(Object::Array(items)) => items.first().and_then(number) == Some(1.0),
        _ => false,
    }
}

/// Output layout for a JPEG: CMYK and gray samples are kept as stored,
/// everything else comes out as RGB
fn jpeg_output(input: JpegColorSpace) -> JpegColorSpace {
    match input {
        JpegColorSpace::Luma => JpegColorSpace::Luma,
        JpegColorSpace::CMYK => JpegColorSpace::CMYK,
        _ => JpegColorSpace::RGB,
    }
}

/// Keep the declared kind when it agrees with the decoded channel count
fn jpeg_kind(declared: &ColorSpace, kind: ImageKind, output: JpegColorSpace) -> ImageKind {
    if declared.components() == Some(output.num_components()) {
        return kind;
    }
    match output {
        JpegColorSpace::Luma => ImageKind::Grayscale,
        JpegColorSpace::CMYK => ImageKind::Cmyk,
        _ => ImageKind::Rgb,
    }
}

fn decode_jpeg(name: &str, data: &[u8], color_space: &ColorSpace, kind: ImageKind) -> Result<RawImage> {
    let decode_err = |reason: String| Error::ImageDecode {
        name: name.to_string(),
        reason: format!("DCTDecode: {}", reason),
    };

    let mut decoder = JpegDecoder::new_with_options(ZCursor::new(data), DecoderOptions::default());
    decoder
        .decode_headers()
        .map_err(|e| decode_err(format!("{:?}", e)))?;

    let input = decoder.input_colorspace().unwrap_or(JpegColorSpace::RGB);
    let output = jpeg_output(input);
    if input == JpegColorSpace::YCCK {
        // zune-jpeg only converts YCCK to RGB
        debug!(name, "YCCK JPEG decoded to RGB");
    }
    let options = decoder.options().jpeg_set_out_colorspace(output);
    decoder.set_options(options);

    let samples = decoder.decode().map_err(|e| decode_err(format!("{:?}", e)))?;
    let info = decoder
        .info()
        .ok_or_else(|| decode_err("no image header".to_string()))?;

    Ok(RawImage::new(
        u32::from(info.width),
        u32::from(info.height),
        jpeg_kind(color_space, kind, output),
        samples,
    ))
}

/// Unpack filtered data into 8-bit (or 16-bit) interleaved samples
///
/// Declared dimensions come from the document, so every size is computed
/// with checked arithmetic and must be backed by the filtered data.
fn unpack(
    name: &str,
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &ColorSpace,
    bpc: u8,
    invert: bool,
) -> Result<Vec<u8>> {
    let decode_err = |reason: String| Error::ImageDecode {
        name: name.to_string(),
        reason,
    };
    let width = width as usize;
    let height = height as usize;

    let Some(components) = color_space.components() else {
        // Without a known colour space only byte-aligned data passes through
        return match bpc {
            8 | 16 => Ok(data.to_vec()),
            _ => Err(Error::UnsupportedImage {
                name: name.to_string(),
                reason: format!("{}-bit samples with an unknown colour space", bpc),
            }),
        };
    };
    if components == 0 {
        return Err(decode_err("colour space has no components".to_string()));
    }
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    let (row_bytes, needed) = match bpc {
        1 | 2 | 4 | 8 | 16 => sample_bytes(width, height, components, bpc).ok_or_else(|| {
            decode_err(format!("declared size {}x{} overflows", width, height))
        })?,
        _ => {
            return Err(Error::UnsupportedImage {
                name: name.to_string(),
                reason: format!("{} bits per component", bpc),
            })
        }
    };
    if data.len() < needed {
        return Err(decode_err(format!(
            "declared size {}x{} needs {} bytes, stream has {}",
            width,
            height,
            needed,
            data.len()
        )));
    }

    match (color_space, bpc) {
        (ColorSpace::Indexed { base, hival, lookup }, 1 | 2 | 4 | 8) => {
            let base_components = base.components().unwrap_or(3);
            let indices = unpack_bits(data, row_bytes, width, height, 1, bpc);
            let mut out = Vec::with_capacity(indices.len() * base_components);
            for index in indices {
                let start = usize::from(index).min(*hival) * base_components;
                for c in 0..base_components {
                    out.push(lookup.get(start + c).copied().unwrap_or(0));
                }
            }
            Ok(out)
        }
        (ColorSpace::Indexed { .. }, _) => Err(Error::UnsupportedImage {
            name: name.to_string(),
            reason: format!("indexed image with {} bits per component", bpc),
        }),
        (_, 8 | 16) => Ok(data[..needed].to_vec()),
        (_, _) => {
            let max = (1u16 << bpc) - 1;
            let mut samples = unpack_bits(data, row_bytes, width, height, components, bpc);
            for sample in samples.iter_mut() {
                let scaled = (u16::from(*sample) * 255 / max) as u8;
                *sample = if invert { 255 - scaled } else { scaled };
            }
            Ok(samples)
        }
    }
}

/// Bytes per row and in total for the declared layout, `None` on overflow
fn sample_bytes(width: usize, height: usize, components: usize, bpc: u8) -> Option<(usize, usize)> {
    let row_bits = width
        .checked_mul(components)?
        .checked_mul(usize::from(bpc))?;
    let row_bytes = row_bits.div_ceil(8);
    Some((row_bytes, row_bytes.checked_mul(height)?))
}

/// One byte per sample from rows padded to byte boundaries
///
/// `data` must hold at least `row_bytes * height` bytes.
fn unpack_bits(data: &[u8], row_bytes: usize, width: usize, height: usize, components: usize, bpc: u8) -> Vec<u8> {
    let samples_per_row = width * components;
    if bpc == 8 {
        return data[..samples_per_row * height].to_vec();
    }

    let bits = usize::from(bpc);
    let mask = (1u16 << bits) as u8 - 1;

    let mut out = Vec::with_capacity(samples_per_row * height);
    for row in data.chunks(row_bytes).take(height) {
        for s in 0..samples_per_row {
            let bit = s * bits;
            let Some(&byte) = row.get(bit / 8) else { break };
            let shift = 8 - bits - (bit % 8);
            out.push((byte >> shift) & mask);
        }
    }
    out
}

/// Interleave a same-sized `/SMask` as an alpha channel
///
/// The mask itself is decoded without its own `/SMask`, so mask cycles end here.
fn apply_soft_mask(doc: &Document, dict: &Dictionary, name: &str, image: RawImage) -> RawImage {
    let Ok(Object::Stream(mask_stream)) = dict.get(b"SMask").map(|o| resolve(doc, o)) else {
        return image;
    };

    let Some(pixels) = (image.width as usize).checked_mul(image.height as usize) else {
        return image;
    };
    let components = if image.bits_per_component == 8 && pixels > 0 {
        image.data.len() / pixels
    } else {
        0
    };
    if !(components == 1 || components == 3) || image.data.len() != pixels * components {
        debug!(name, "soft mask ignored for this sample layout");
        return image;
    }

    let mask = match decode_samples(doc, mask_stream, name) {
        Ok(mask) => mask,
        Err(e) => {
            debug!(name, error = %e, "soft mask could not be decoded");
            return image;
        }
    };
    if mask.width != image.width
        || mask.height != image.height
        || mask.bits_per_component != 8
        || mask.data.len() != pixels
    {
        debug!(name, "soft mask dimensions differ from image");
        return image;
    }

    let mut data = Vec::with_capacity(pixels * (components + 1));
    for (pixel, alpha) in image.data.chunks_exact(components).zip(mask.data.iter()) {
        data.extend_from_slice(pixel);
        data.push(*alpha);
    }
    RawImage { data, ..image }
}

/// Copy of an inline image stream with its dictionary expanded
pub fn expand_inline_stream(stream: &Stream) -> Stream {
    Stream::new(expand_inline_dict(&stream.dict), stream.content.clone())
}
