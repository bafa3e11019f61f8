use chrono::{DateTime, Utc};
use std::fmt;

use monocle_core::{AnonType, DecryptedPayload};

use crate::ip::IpFamily;

pub const INCOMPLETE_JUSTIFICATION: &str = "Incomplete data.";
pub const ANONYMIZED_JUSTIFICATION: &str = "Anonymized session.";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The checks, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    Completeness,
    IpConsistency,
    TimestampFreshness,
    AnonymizationFlags,
}

impl CheckKind {
    pub const ORDER: [CheckKind; 4] = [
        CheckKind::Completeness,
        CheckKind::IpConsistency,
        CheckKind::TimestampFreshness,
        CheckKind::AnonymizationFlags,
    ];
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckKind::Completeness => write!(f, "completeness"),
            CheckKind::IpConsistency => write!(f, "ip_consistency"),
            CheckKind::TimestampFreshness => write!(f, "timestamp_freshness"),
            CheckKind::AnonymizationFlags => write!(f, "anonymization_flags"),
        }
    }
}

/// Result of one check.
///
/// A triggered check always carries a justification. `anon_type` may be
/// `None` even when triggered: the flags check without a proxy/VPN
/// sub-flag leaves the type to earlier checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub check: CheckKind,
    pub triggered: bool,
    pub anon_type: Option<AnonType>,
    pub justification: Option<String>,
}

impl CheckOutcome {
    pub fn pass(check: CheckKind) -> Self {
        Self {
            check,
            triggered: false,
            anon_type: None,
            justification: None,
        }
    }

    pub fn flagged(check: CheckKind, anon_type: Option<AnonType>, justification: String) -> Self {
        Self {
            check,
            triggered: true,
            anon_type,
            justification: Some(justification),
        }
    }
}

/// The collector reports `complete: true` only when it finished its own
/// evaluation; anything else raises the odds of a wrong verdict.
pub fn check_completeness(payload: &DecryptedPayload) -> CheckOutcome {
    if payload.is_complete() {
        CheckOutcome::pass(CheckKind::Completeness)
    } else {
        CheckOutcome::flagged(
            CheckKind::Completeness,
            Some(AnonType::Incomplete),
            INCOMPLETE_JUSTIFICATION.to_string(),
        )
    }
}

/// Flags a mismatch only when both addresses parse and share a family.
///
/// Mixed families (a dual-stack client) and unparsable addresses do not
/// trigger.
pub fn check_ip_consistency(payload: &DecryptedPayload, request_ip: &str) -> CheckOutcome {
    let bundle_ip = match payload.ip.as_deref() {
        Some(ip) if ip != request_ip => ip,
        _ => return CheckOutcome::pass(CheckKind::IpConsistency),
    };

    match (IpFamily::classify(bundle_ip), IpFamily::classify(request_ip)) {
        (Some(ours), Some(theirs)) if ours == theirs => CheckOutcome::flagged(
            CheckKind::IpConsistency,
            Some(AnonType::Ip),
            format!(
                "IP address mismatch. Bundle: {}; Request: {}",
                bundle_ip, request_ip
            ),
        ),
        (Some(ours), Some(theirs)) => {
            tracing::debug!(bundle = %ours, request = %theirs, "address families differ, not flagging");
            CheckOutcome::pass(CheckKind::IpConsistency)
        }
        _ => {
            tracing::debug!("unclassifiable address, skipping ip consistency check");
            CheckOutcome::pass(CheckKind::IpConsistency)
        }
    }
}

/// Flags bundles stamped strictly before `cutoff`.
pub fn check_timestamp(payload: &DecryptedPayload, cutoff: DateTime<Utc>) -> CheckOutcome {
    match payload.ts {
        Some(ts) if ts < cutoff => CheckOutcome::flagged(
            CheckKind::TimestampFreshness,
            Some(AnonType::Timestamp),
            format!(
                "Timestamp out of range: {}. Oldest accepted time: {}",
                ts.format(TIME_FORMAT),
                cutoff.format(TIME_FORMAT)
            ),
        ),
        _ => CheckOutcome::pass(CheckKind::TimestampFreshness),
    }
}

/// Honors the collector's own verdict. VPN wins over proxy.
pub fn check_anonymization_flags(payload: &DecryptedPayload) -> CheckOutcome {
    if !payload.is_flagged_anon() {
        return CheckOutcome::pass(CheckKind::AnonymizationFlags);
    }

    let mut anon_type = None;
    if payload.is_flagged_proxied() {
        anon_type = Some(AnonType::Proxy);
    }
    if payload.is_flagged_vpn() {
        anon_type = Some(AnonType::Vpn);
    }

    CheckOutcome::flagged(
        CheckKind::AnonymizationFlags,
        anon_type,
        ANONYMIZED_JUSTIFICATION.to_string(),
    )
}
