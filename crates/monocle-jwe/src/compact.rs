//! JWE compact serialization (RFC 7516 §7.1).
//!
//! `BASE64URL(header) . BASE64URL(encrypted key) . BASE64URL(iv) .
//! BASE64URL(ciphertext) . BASE64URL(tag)`

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::error::{JweError, JweResult};

const SEGMENT_COUNT: usize = 5;

/// A compact JWE split into its decoded parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactJwe {
    /// The protected header exactly as transmitted. It is the AAD.
    pub header_b64: String,
    pub header: Vec<u8>,
    pub encrypted_key: Vec<u8>,
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Remove every carriage return and line feed. Collectors may wrap the token.
pub fn normalize(bundle: &str) -> String {
    bundle.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}

impl CompactJwe {
    /// Split and decode a compact JWE. The input is normalized first.
    pub fn parse(bundle: &str) -> JweResult<Self> {
        let token = normalize(bundle);
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != SEGMENT_COUNT {
            return Err(JweError::MalformedBundle(format!(
                "expected {} segments, got {}",
                SEGMENT_COUNT,
                segments.len()
            )));
        }

        for (name, segment) in [("header", segments[0]), ("iv", segments[2]), ("tag", segments[4])] {
            if segment.is_empty() {
                return Err(JweError::MalformedBundle(format!("empty {} segment", name)));
            }
        }

        Ok(Self {
            header_b64: segments[0].to_string(),
            header: decode_segment("header", segments[0])?,
            encrypted_key: decode_segment("encrypted key", segments[1])?,
            iv: decode_segment("iv", segments[2])?,
            ciphertext: decode_segment("ciphertext", segments[3])?,
            tag: decode_segment("tag", segments[4])?,
        })
    }

    /// Re-assemble the compact form.
    pub fn serialize(&self) -> String {
        [
            self.header_b64.clone(),
            URL_SAFE_NO_PAD.encode(&self.encrypted_key),
            URL_SAFE_NO_PAD.encode(&self.iv),
            URL_SAFE_NO_PAD.encode(&self.ciphertext),
            URL_SAFE_NO_PAD.encode(&self.tag),
        ]
        .join(".")
    }
}

/// Decode one unpadded base64url segment.
pub fn decode_segment(name: &str, segment: &str) -> JweResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| JweError::MalformedBundle(format!("{} segment is not base64url", name)))
}

pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}
