//! Stream filter decoding for image data
//!
//! Covers the general-purpose filters. Image codecs (DCT, JPX, JBIG2,
//! CCITT) are handled or rejected by the caller.

use std::io::Read;

use flate2::read::ZlibDecoder;
use lopdf::{Dictionary, Object};

/// Canonical filter name, expanding inline-image abbreviations
pub fn canonical_filter(name: &str) -> &str {
    match name {
        "Fl" => "FlateDecode",
        "LZW" => "LZWDecode",
        "AHx" => "ASCIIHexDecode",
        "A85" => "ASCII85Decode",
        "RL" => "RunLengthDecode",
        "DCT" => "DCTDecode",
        "CCF" => "CCITTFaxDecode",
        other => other,
    }
}

/// Apply one filter to `data`
pub fn decode(data: &[u8], filter: &str, params: Option<&Dictionary>) -> Result<Vec<u8>, String> {
    match canonical_filter(filter) {
        "FlateDecode" => {
            let inflated = inflate(data)?;
            apply_predictor(inflated, params)
        }
        "LZWDecode" => {
            let early_change = params
                .and_then(|p| p.get(b"EarlyChange").ok())
                .and_then(|o| o.as_i64().ok())
                .unwrap_or(1);
            let decoded = lzw_decode(data, early_change != 0)?;
            apply_predictor(decoded, params)
        }
        "ASCIIHexDecode" => Ok(ascii_hex_decode(data)),
        "ASCII85Decode" => ascii85_decode(data),
        "RunLengthDecode" => Ok(run_length_decode(data)),
        other => Err(format!("unsupported filter {}", other)),
    }
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, String> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    match decoder.read_to_end(&mut out) {
        Ok(_) => Ok(out),
        // Truncated streams are common; keep what was inflated
        Err(_) if !out.is_empty() => Ok(out),
        Err(e) => Err(format!("FlateDecode error: {}", e)),
    }
}

fn lzw_decode(data: &[u8], early_change: bool) -> Result<Vec<u8>, String> {
    use weezl::{decode::Decoder, BitOrder};

    let mut decoder = if early_change {
        Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
    } else {
        Decoder::new(BitOrder::Msb, 8)
    };
    decoder
        .decode(data)
        .map_err(|e| format!("LZWDecode error: {}", e))
}

fn param_usize(params: &Dictionary, key: &[u8], default: usize) -> usize {
    params
        .get(key)
        .ok()
        .and_then(|o| match o {
            Object::Integer(n) if *n > 0 => Some(*n as usize),
            _ => None,
        })
        .unwrap_or(default)
}

/// Undo a PNG predictor (`/Predictor` 10 to 15)
fn apply_predictor(data: Vec<u8>, params: Option<&Dictionary>) -> Result<Vec<u8>, String> {
    let Some(params) = params else {
        return Ok(data);
    };

    let predictor = param_usize(params, b"Predictor", 1);
    match predictor {
        1 => Ok(data),
        2 => Err("TIFF predictor is not supported".to_string()),
        _ => {
            let colors = param_usize(params, b"Colors", 1);
            let bits = param_usize(params, b"BitsPerComponent", 8);
            let columns = param_usize(params, b"Columns", 1);
            png_unpredict(&data, colors, bits, columns)
        }
    }
}

fn png_unpredict(data: &[u8], colors: usize, bits: usize, columns: usize) -> Result<Vec<u8>, String> {
    let overflow = || format!("predictor parameters overflow ({} columns, {} colors)", columns, colors);
    let pixel_bits = colors.checked_mul(bits).ok_or_else(overflow)?;
    let row_bits = columns.checked_mul(pixel_bits).ok_or_else(overflow)?;
    let pixel_bytes = pixel_bits.div_ceil(8).max(1);
    let row_bytes = row_bits.div_ceil(8);
    if data.is_empty() {
        return Ok(Vec::new());
    }
    // Every predicted row carries a tag byte ahead of its samples
    if row_bytes >= data.len() {
        return Err(format!(
            "predictor row of {} bytes exceeds the {} bytes of data",
            row_bytes,
            data.len()
        ));
    }
    let stride = row_bytes + 1;

    let mut out = Vec::with_capacity(data.len() / stride * row_bytes);
    let mut prev = vec![0u8; row_bytes];
    let mut row = vec![0u8; row_bytes];

    for chunk in data.chunks(stride) {
        if chunk.len() < 2 {
            break;
        }
        let filter = chunk[0];
        let raw = &chunk[1..];
        row.fill(0);
        row[..raw.len()].copy_from_slice(raw);

        for i in 0..row_bytes {
            let left = if i >= pixel_bytes { row[i - pixel_bytes] } else { 0 };
            let up = prev[i];
            let up_left = if i >= pixel_bytes { prev[i - pixel_bytes] } else { 0 };
            let predicted = match filter {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((u16::from(left) + u16::from(up)) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => return Err(format!("invalid PNG predictor tag {}", other)),
            };
            row[i] = row[i].wrapping_add(predicted);
        }

        out.extend_from_slice(&row[..raw.len()]);
        std::mem::swap(&mut prev, &mut row);
    }

    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

fn ascii_hex_decode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut pending: Option<u8> = None;

    for &byte in data {
        let nibble = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            b'>' => break,
            _ => continue,
        };
        match pending.take() {
            Some(high) => out.push((high << 4) | nibble),
            None => pending = Some(nibble),
        }
    }
    if let Some(high) = pending {
        out.push(high << 4);
    }
    out
}

fn ascii85_decode(data: &[u8]) -> Result<Vec<u8>, String> {
    let data = data.strip_prefix(b"<~").unwrap_or(data);
    let end = data.iter().position(|&b| b == b'~').unwrap_or(data.len());

    let mut out = Vec::with_capacity(end * 4 / 5);
    let mut group = [0u8; 5];
    let mut count = 0;

    for &byte in &data[..end] {
        match byte {
            b'z' if count == 0 => out.extend_from_slice(&[0; 4]),
            b'!'..=b'u' => {
                group[count] = byte - b'!';
                count += 1;
                if count == 5 {
                    out.extend_from_slice(&ascii85_group(&group)?);
                    count = 0;
                }
            }
            b if b.is_ascii_whitespace() || b == 0 => {}
            other => return Err(format!("invalid ASCII85 byte 0x{:02x}", other)),
        }
    }

    if count > 1 {
        for slot in group.iter_mut().skip(count) {
            *slot = b'u' - b'!';
        }
        let bytes = ascii85_group(&group)?;
        out.extend_from_slice(&bytes[..count - 1]);
    }

    Ok(out)
}

fn ascii85_group(group: &[u8; 5]) -> Result<[u8; 4], String> {
    let value = group
        .iter()
        .fold(0u64, |acc, &digit| acc * 85 + u64::from(digit));
    u32::try_from(value)
        .map(u32::to_be_bytes)
        .map_err(|_| "ASCII85 group out of range".to_string())
}

fn run_length_decode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let length = data[i];
        i += 1;
        match length {
            128 => break,
            0..=127 => {
                let end = (i + length as usize + 1).min(data.len());
                out.extend_from_slice(&data[i..end]);
                i = end;
            }
            _ => {
                if let Some(&byte) = data.get(i) {
                    out.extend(std::iter::repeat(byte).take(257 - length as usize));
                    i += 1;
                }
            }
        }
    }
    out
}
