use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce as AesNonce};
use rand::RngCore;

use crate::error::{JweError, JweResult};

// AES-256-GCM content encryption for A256GCM bundles.
//
// The compact form carries ciphertext and tag as separate segments; the
// `aead` API wants them concatenated. Tag comparison happens inside
// `aes-gcm` in constant time, and no plaintext is released unless the tag
// verifies.

pub const KEY_SIZE: usize = 32;
pub const IV_SIZE: usize = 12; // 96-bit IV mandated for A256GCM
pub const TAG_SIZE: usize = 16;

/// Ciphertext and detached tag produced by [`encrypt`].
#[derive(Debug, Clone)]
pub struct Sealed {
    pub iv: [u8; IV_SIZE],
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Decrypt `ciphertext` with its detached `tag`, authenticating `aad`.
pub fn decrypt(key: &[u8], iv: &[u8], aad: &[u8], ciphertext: &[u8], tag: &[u8]) -> JweResult<Vec<u8>> {
    if key.len() != KEY_SIZE {
        return Err(JweError::MalformedBundle(format!(
            "content key must be {} bytes",
            KEY_SIZE
        )));
    }
    if iv.len() != IV_SIZE {
        return Err(JweError::MalformedBundle(format!(
            "iv must be {} bytes, got {}",
            IV_SIZE,
            iv.len()
        )));
    }
    if tag.len() != TAG_SIZE {
        return Err(JweError::MalformedBundle(format!(
            "tag must be {} bytes, got {}",
            TAG_SIZE,
            tag.len()
        )));
    }

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| JweError::MalformedBundle("invalid content key".into()))?;

    let mut msg = Vec::with_capacity(ciphertext.len() + TAG_SIZE);
    msg.extend_from_slice(ciphertext);
    msg.extend_from_slice(tag);

    cipher
        .decrypt(AesNonce::from_slice(iv), Payload { msg: &msg, aad })
        .map_err(|_| JweError::AuthenticationFailure)
}

/// Encrypt under a fresh random IV, returning ciphertext and detached tag.
pub fn encrypt(key: &[u8], aad: &[u8], plaintext: &[u8]) -> JweResult<Sealed> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| JweError::KeyMaterial(format!("content key must be {} bytes", KEY_SIZE)))?;

    let mut iv = [0u8; IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let mut sealed = cipher
        .encrypt(AesNonce::from_slice(&iv), Payload { msg: plaintext, aad })
        .map_err(|_| JweError::KeyMaterial("content encryption failed".into()))?;
    let tag = sealed.split_off(sealed.len() - TAG_SIZE);

    Ok(Sealed {
        iv,
        ciphertext: sealed,
        tag,
    })
}
