use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// AnonType: why a session was flagged
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnonType {
    /// The collector could not finish its evaluation.
    Incomplete,
    /// Address seen by the collector differs from the request address.
    Ip,
    /// Bundle timestamp is older than the freshness window.
    Timestamp,
    Proxy,
    Vpn,
}

impl AnonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnonType::Incomplete => "incomplete",
            AnonType::Ip => "ip",
            AnonType::Timestamp => "timestamp",
            AnonType::Proxy => "proxy",
            AnonType::Vpn => "vpn",
        }
    }
}

impl fmt::Display for AnonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DecryptedPayload: the signals carried inside a threat bundle
// ---------------------------------------------------------------------------

/// Typed view of a decrypted threat bundle.
///
/// Every field is optional. A field that was missing or carried the wrong
/// JSON type is `None`; the evaluator treats that as "check does not
/// apply" rather than as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptedPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anon: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpn: Option<bool>,
}

impl DecryptedPayload {
    /// True when the collector reported a finished evaluation.
    pub fn is_complete(&self) -> bool {
        self.complete == Some(true)
    }

    pub fn is_flagged_anon(&self) -> bool {
        self.anon == Some(true)
    }

    pub fn is_flagged_proxied(&self) -> bool {
        self.proxied == Some(true)
    }

    pub fn is_flagged_vpn(&self) -> bool {
        self.vpn == Some(true)
    }
}

// ---------------------------------------------------------------------------
// EvaluationResult: the verdict handed back to the caller
// ---------------------------------------------------------------------------

/// Verdict of a session evaluation.
///
/// `is_anon_session` is 1 exactly when at least one justification was
/// recorded. `anon_type` holds the type set by the last check that set one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    is_anon_session: u8,
    anon_type: Option<AnonType>,
    justifications: Vec<String>,
}

impl EvaluationResult {
    pub fn from_parts(anon_type: Option<AnonType>, justifications: Vec<String>) -> Self {
        Self {
            is_anon_session: u8::from(!justifications.is_empty()),
            anon_type,
            justifications,
        }
    }

    /// A verdict with nothing flagged.
    pub fn clean() -> Self {
        Self::from_parts(None, Vec::new())
    }

    pub fn is_anon_session(&self) -> u8 {
        self.is_anon_session
    }

    pub fn is_anonymized(&self) -> bool {
        self.is_anon_session == 1
    }

    pub fn anon_type(&self) -> Option<AnonType> {
        self.anon_type
    }

    pub fn justifications(&self) -> &[String] {
        &self.justifications
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anon_type_serde_lowercase() {
        let json = serde_json::to_string(&AnonType::Vpn).unwrap();
        assert_eq!(json, "\"vpn\"");
        let back: AnonType = serde_json::from_str("\"timestamp\"").unwrap();
        assert_eq!(back, AnonType::Timestamp);
    }

    #[test]
    fn test_anon_type_display() {
        assert_eq!(AnonType::Incomplete.to_string(), "incomplete");
        assert_eq!(AnonType::Proxy.to_string(), "proxy");
    }

    #[test]
    fn test_clean_result_shape() {
        let result = EvaluationResult::clean();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "is_anon_session": 0,
                "anon_type": null,
                "justifications": []
            })
        );
        assert!(!result.is_anonymized());
    }

    #[test]
    fn test_flagged_result_shape() {
        let result = EvaluationResult::from_parts(
            Some(AnonType::Vpn),
            vec!["Incomplete data.".into(), "Anonymized session.".into()],
        );
        assert_eq!(result.is_anon_session(), 1);
        assert_eq!(result.anon_type(), Some(AnonType::Vpn));
        assert_eq!(result.justifications().len(), 2);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["anon_type"], "vpn");
        assert_eq!(json["is_anon_session"], 1);
    }

    #[test]
    fn test_payload_flags_require_exact_true() {
        let payload = DecryptedPayload {
            complete: Some(false),
            anon: None,
            vpn: Some(true),
            ..Default::default()
        };
        assert!(!payload.is_complete());
        assert!(!payload.is_flagged_anon());
        assert!(payload.is_flagged_vpn());
        assert!(!payload.is_flagged_proxied());
    }

    #[test]
    fn test_payload_serialization_skips_absent_fields() {
        let payload = DecryptedPayload {
            complete: Some(true),
            ip: Some("203.0.113.5".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "complete": true, "ip": "203.0.113.5" })
        );
    }
}
