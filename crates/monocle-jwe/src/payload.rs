use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use monocle_core::DecryptedPayload;

use crate::error::{JweError, JweResult};

/// Integral timestamps at or above this are read as Unix milliseconds.
const MILLIS_THRESHOLD: u64 = 100_000_000_000;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Decode decrypted bytes into a [`DecryptedPayload`].
///
/// The bytes must hold a non-empty JSON object. Recognized members with the
/// wrong JSON type are dropped rather than rejected; unknown members are
/// ignored.
pub fn decode_payload(bytes: &[u8]) -> JweResult<DecryptedPayload> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(JweError::PayloadDecode("decrypted payload is empty".into()));
    }

    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| JweError::PayloadDecode(format!("payload is not valid JSON: {}", e)))?;

    let obj = match value {
        Value::Object(obj) if obj.is_empty() => {
            return Err(JweError::PayloadDecode("payload object is empty".into()))
        }
        Value::Object(obj) => obj,
        other => {
            return Err(JweError::PayloadDecode(format!(
                "payload must be a JSON object, got {}",
                json_type_name(&other)
            )))
        }
    };

    Ok(DecryptedPayload {
        complete: loose_bool(&obj, "complete"),
        ip: obj.get("ip").and_then(Value::as_str).map(str::to_string),
        ts: obj.get("ts").and_then(parse_timestamp),
        anon: loose_bool(&obj, "anon"),
        proxied: loose_bool(&obj, "proxied"),
        vpn: loose_bool(&obj, "vpn"),
    })
}

fn loose_bool(obj: &Map<String, Value>, name: &str) -> Option<bool> {
    obj.get(name).and_then(Value::as_bool)
}

/// Interpret a `ts` member. Accepts RFC 3339 strings, zone-less
/// `YYYY-MM-DD HH:MM:SS[.f]` strings (taken as UTC) and integral Unix
/// seconds or milliseconds. Anything else is `None`.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| naive.and_utc())
        }
        Value::Number(n) => {
            let raw = n.as_i64()?;
            if raw.unsigned_abs() >= MILLIS_THRESHOLD {
                DateTime::from_timestamp_millis(raw)
            } else {
                DateTime::from_timestamp(raw, 0)
            }
        }
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
