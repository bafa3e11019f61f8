use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::error::{JweError, JweResult};

/// Inflate a raw DEFLATE stream (RFC 1951, `zip: "DEF"`).
///
/// Output beyond `max_len` bytes is rejected so a small bundle cannot
/// expand without bound.
pub fn inflate(data: &[u8], max_len: usize) -> JweResult<Vec<u8>> {
    let mut out = Vec::new();
    DeflateDecoder::new(data)
        .take(max_len as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| JweError::MalformedBundle(format!("DEFLATE decompression failed: {}", e)))?;
    if out.len() > max_len {
        return Err(JweError::MalformedBundle(format!(
            "decompressed payload exceeds {} bytes",
            max_len
        )));
    }
    Ok(out)
}

/// Compress with raw DEFLATE.
pub fn deflate(data: &[u8]) -> JweResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| JweError::MalformedBundle(format!("DEFLATE compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| JweError::MalformedBundle(format!("DEFLATE compression failed: {}", e)))
}
