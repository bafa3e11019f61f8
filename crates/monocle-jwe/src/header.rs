use serde_json::{Map, Value};

use crate::compact::decode_segment;
use crate::error::{JweError, JweResult};

pub const ALG_ECDH_ES: &str = "ECDH-ES";
pub const ENC_A256GCM: &str = "A256GCM";
pub const ZIP_DEFLATE: &str = "DEF";
pub const KTY_EC: &str = "EC";
pub const CRV_P256: &str = "P-256";

/// P-256 coordinate length in bytes.
const COORDINATE_LEN: usize = 32;

/// The sender's ephemeral public key (`epk`), as affine coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EphemeralKey {
    pub x: Vec<u8>,
    pub y: Vec<u8>,
}

impl EphemeralKey {
    /// Uncompressed SEC1 encoding: `0x04 || x || y`.
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.x.len() + self.y.len());
        out.push(0x04);
        out.extend_from_slice(&self.x);
        out.extend_from_slice(&self.y);
        out
    }
}

/// The protected header of an ECDH-ES / A256GCM bundle, after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedHeader {
    pub alg: String,
    pub enc: String,
    pub zip: Option<String>,
    pub kid: Option<String>,
    pub epk: EphemeralKey,
    pub apu: Vec<u8>,
    pub apv: Vec<u8>,
}

impl ProtectedHeader {
    pub fn is_deflated(&self) -> bool {
        self.zip.as_deref() == Some(ZIP_DEFLATE)
    }

    /// Parse and validate the decoded header bytes.
    ///
    /// Invalid JSON or structurally broken members are `MalformedBundle`.
    /// Anything other than ECDH-ES + A256GCM (+ optional DEF) on P-256 is
    /// `UnsupportedAlgorithm`.
    pub fn parse(bytes: &[u8]) -> JweResult<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| JweError::MalformedBundle(format!("header is not valid JSON: {}", e)))?;
        let obj = value
            .as_object()
            .ok_or_else(|| JweError::MalformedBundle("header is not a JSON object".into()))?;

        let alg = required_algorithm(obj, "alg", ALG_ECDH_ES)?;
        let enc = required_algorithm(obj, "enc", ENC_A256GCM)?;

        if let Some(crit) = obj.get("crit") {
            let listed = crit.as_array().map(|a| !a.is_empty()).unwrap_or(true);
            if listed {
                return Err(JweError::UnsupportedAlgorithm(
                    "critical header extensions are not supported".into(),
                ));
            }
        }

        let zip = match obj.get("zip") {
            None => None,
            Some(Value::String(z)) if z == ZIP_DEFLATE => Some(z.clone()),
            Some(other) => {
                return Err(JweError::UnsupportedAlgorithm(format!(
                    "compression {} is not supported",
                    other
                )))
            }
        };

        let kid = obj.get("kid").and_then(Value::as_str).map(str::to_string);
        let epk = parse_epk(obj.get("epk"))?;
        let apu = optional_b64_member(obj, "apu")?;
        let apv = optional_b64_member(obj, "apv")?;

        Ok(Self {
            alg,
            enc,
            zip,
            kid,
            epk,
            apu,
            apv,
        })
    }
}

fn required_algorithm(obj: &Map<String, Value>, name: &str, expected: &str) -> JweResult<String> {
    match obj.get(name).and_then(Value::as_str) {
        Some(v) if v == expected => Ok(v.to_string()),
        Some(v) => Err(JweError::UnsupportedAlgorithm(format!(
            "{} {} is not accepted, expected {}",
            name, v, expected
        ))),
        None => Err(JweError::UnsupportedAlgorithm(format!(
            "header does not declare {}",
            name
        ))),
    }
}

fn optional_b64_member(obj: &Map<String, Value>, name: &str) -> JweResult<Vec<u8>> {
    match obj.get(name) {
        None => Ok(Vec::new()),
        Some(Value::String(s)) => decode_segment(name, s),
        Some(_) => Err(JweError::MalformedBundle(format!("{} must be a string", name))),
    }
}

fn parse_epk(value: Option<&Value>) -> JweResult<EphemeralKey> {
    let jwk = value
        .and_then(Value::as_object)
        .ok_or_else(|| JweError::MalformedBundle("header has no epk object".into()))?;

    let kty = jwk.get("kty").and_then(Value::as_str).unwrap_or_default();
    if kty != KTY_EC {
        return Err(JweError::UnsupportedAlgorithm(format!(
            "epk key type {:?} is not supported",
            kty
        )));
    }
    let crv = jwk.get("crv").and_then(Value::as_str).unwrap_or_default();
    if crv != CRV_P256 {
        return Err(JweError::UnsupportedAlgorithm(format!(
            "epk curve {:?} is not supported",
            crv
        )));
    }

    let coordinate = |name: &str| -> JweResult<Vec<u8>> {
        let raw = jwk
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| JweError::MalformedBundle(format!("epk is missing {}", name)))?;
        let bytes = decode_segment(name, raw)?;
        if bytes.len() != COORDINATE_LEN {
            return Err(JweError::MalformedBundle(format!(
                "epk {} must be {} bytes",
                name, COORDINATE_LEN
            )));
        }
        Ok(bytes)
    };

    Ok(EphemeralKey {
        x: coordinate("x")?,
        y: coordinate("y")?,
    })
}
