//! Bundle decryption: compact JWE → [`DecryptedPayload`].

use std::sync::Arc;

use p256::PublicKey;
use zeroize::Zeroizing;

use monocle_core::{BundleOpener, DecryptedPayload, MonocleResult};

use crate::cipher;
use crate::compact::CompactJwe;
use crate::compression;
use crate::error::{JweError, JweResult};
use crate::header::{ProtectedHeader, ENC_A256GCM};
use crate::kdf::concat_kdf;
use crate::key::BundleKey;
use crate::payload::decode_payload;

/// A256GCM key length in bits, fed to the KDF as SuppPubInfo.
const CEK_BITS: u32 = 256;

/// Default ceiling on inflated plaintext.
pub const DEFAULT_MAX_INFLATED_BYTES: usize = 256 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptorOptions {
    pub max_inflated_bytes: usize,
}

impl Default for DecryptorOptions {
    fn default() -> Self {
        Self {
            max_inflated_bytes: DEFAULT_MAX_INFLATED_BYTES,
        }
    }
}

/// Opens threat bundles with one static private key.
///
/// Built once at startup; holds nothing mutable, so a single instance can
/// serve concurrent requests behind an `Arc`.
#[derive(Debug, Clone)]
pub struct BundleDecryptor {
    key: Arc<BundleKey>,
    options: DecryptorOptions,
}

impl BundleDecryptor {
    pub fn new(key: BundleKey) -> Self {
        Self::with_options(key, DecryptorOptions::default())
    }

    pub fn with_options(key: BundleKey, options: DecryptorOptions) -> Self {
        Self {
            key: Arc::new(key),
            options,
        }
    }

    pub fn key(&self) -> &BundleKey {
        &self.key
    }

    pub fn options(&self) -> &DecryptorOptions {
        &self.options
    }

    /// Decrypt, decompress and decode a bundle.
    pub fn decrypt(&self, bundle: &str) -> JweResult<DecryptedPayload> {
        let plaintext = self.decrypt_bytes(bundle)?;
        decode_payload(&plaintext)
    }

    /// Decrypt and decompress a bundle, returning the raw plaintext.
    pub fn decrypt_bytes(&self, bundle: &str) -> JweResult<Zeroizing<Vec<u8>>> {
        let result = open(&self.key, &self.options, bundle);
        if let Err(e) = &result {
            tracing::warn!(key_id = %self.key.key_id(), error = %e, "bundle rejected");
        }
        result
    }
}

impl BundleOpener for BundleDecryptor {
    fn open(&self, bundle: &str) -> MonocleResult<DecryptedPayload> {
        Ok(self.decrypt(bundle)?)
    }

    fn key_id(&self) -> String {
        self.key.key_id().to_string()
    }
}

/// Decrypt a bundle with `key` and default options.
pub fn decrypt(bundle: &str, key: &BundleKey) -> JweResult<DecryptedPayload> {
    let plaintext = open(key, &DecryptorOptions::default(), bundle)?;
    decode_payload(&plaintext)
}

fn open(key: &BundleKey, options: &DecryptorOptions, bundle: &str) -> JweResult<Zeroizing<Vec<u8>>> {
    let jwe = CompactJwe::parse(bundle)?;
    let header = ProtectedHeader::parse(&jwe.header)?;

    tracing::debug!(
        kid = ?header.kid,
        deflated = header.is_deflated(),
        ciphertext_len = jwe.ciphertext.len(),
        "opening bundle"
    );

    // Direct key agreement: there is no wrapped key to carry.
    if !jwe.encrypted_key.is_empty() {
        return Err(JweError::MalformedBundle(
            "encrypted key must be empty for ECDH-ES".into(),
        ));
    }

    let epk = PublicKey::from_sec1_bytes(&header.epk.to_sec1_bytes())
        .map_err(|_| JweError::MalformedBundle("epk is not a valid P-256 point".into()))?;

    let z = key.agree(&epk);
    let cek = concat_kdf(z.as_slice(), ENC_A256GCM, &header.apu, &header.apv, CEK_BITS);

    let plaintext = Zeroizing::new(cipher::decrypt(
        &cek,
        &jwe.iv,
        jwe.header_b64.as_bytes(),
        &jwe.ciphertext,
        &jwe.tag,
    )?);

    if header.is_deflated() {
        Ok(Zeroizing::new(compression::inflate(
            &plaintext,
            options.max_inflated_bytes,
        )?))
    } else {
        Ok(plaintext)
    }
}
