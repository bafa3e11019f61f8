use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use serde_json::{json, Map, Value};

use crate::cipher;
use crate::compact::encode_segment;
use crate::compression;
use crate::error::{JweError, JweResult};
use crate::header::{ALG_ECDH_ES, CRV_P256, ENC_A256GCM, KTY_EC, ZIP_DEFLATE};
use crate::kdf::concat_kdf;
use crate::key::BundleKey;

#[derive(Debug, Clone, Default)]
pub struct SealOptions {
    /// Compress the plaintext with DEFLATE and declare `zip: "DEF"`.
    pub deflate: bool,
    pub apu: Vec<u8>,
    pub apv: Vec<u8>,
    pub kid: Option<String>,
}

/// Encrypt `plaintext` to `recipient` as a compact ECDH-ES / A256GCM JWE.
///
/// A fresh ephemeral key is generated per call. The encrypted-key segment
/// is empty, as direct key agreement requires.
pub fn seal(plaintext: &[u8], recipient: &PublicKey, options: &SealOptions) -> JweResult<String> {
    let ephemeral = BundleKey::from_secret(SecretKey::random(&mut rand::rngs::OsRng));
    let point = ephemeral.public_key().to_encoded_point(false);
    let (x, y) = match (point.x(), point.y()) {
        (Some(x), Some(y)) => (x, y),
        _ => return Err(JweError::KeyMaterial("ephemeral key has no coordinates".into())),
    };

    let mut header = Map::new();
    header.insert("alg".into(), json!(ALG_ECDH_ES));
    header.insert("enc".into(), json!(ENC_A256GCM));
    header.insert(
        "epk".into(),
        json!({
            "kty": KTY_EC,
            "crv": CRV_P256,
            "x": encode_segment(x),
            "y": encode_segment(y),
        }),
    );
    if options.deflate {
        header.insert("zip".into(), json!(ZIP_DEFLATE));
    }
    if !options.apu.is_empty() {
        header.insert("apu".into(), json!(encode_segment(&options.apu)));
    }
    if !options.apv.is_empty() {
        header.insert("apv".into(), json!(encode_segment(&options.apv)));
    }
    if let Some(kid) = &options.kid {
        header.insert("kid".into(), json!(kid));
    }

    let header_json = serde_json::to_vec(&Value::Object(header))
        .map_err(|e| JweError::MalformedBundle(format!("header serialization failed: {}", e)))?;
    let header_b64 = encode_segment(&header_json);

    let z = ephemeral.agree(recipient);
    let cek = concat_kdf(z.as_slice(), ENC_A256GCM, &options.apu, &options.apv, 256);

    let body = if options.deflate {
        compression::deflate(plaintext)?
    } else {
        plaintext.to_vec()
    };
    let sealed = cipher::encrypt(&cek, header_b64.as_bytes(), &body)?;

    Ok(format!(
        "{}..{}.{}.{}",
        header_b64,
        encode_segment(&sealed.iv),
        encode_segment(&sealed.ciphertext),
        encode_segment(&sealed.tag)
    ))
}
