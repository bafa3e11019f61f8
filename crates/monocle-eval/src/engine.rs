use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use monocle_core::{DecryptedPayload, EvaluationResult};

use crate::checks::{
    check_anonymization_flags, check_completeness, check_ip_consistency, check_timestamp,
    CheckOutcome,
};
use crate::error::{EvalError, EvalResult};

/// Upper bound on the freshness window. Anything wider makes the check moot.
const MAX_BUNDLE_AGE_LIMIT_SECS: u64 = 24 * 60 * 60;

// ---------------------------------------------------------------------------
// EvaluatorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Bundles stamped earlier than `now - max_bundle_age_secs` are stale.
    #[serde(default = "default_max_bundle_age_secs")]
    pub max_bundle_age_secs: u64,
}

fn default_max_bundle_age_secs() -> u64 {
    10 * 60
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_bundle_age_secs: default_max_bundle_age_secs(),
        }
    }
}

impl EvaluatorConfig {
    pub fn validate(&self) -> EvalResult<()> {
        if self.max_bundle_age_secs == 0 {
            return Err(EvalError::InvalidConfig(
                "max_bundle_age_secs must be > 0".into(),
            ));
        }
        if self.max_bundle_age_secs > MAX_BUNDLE_AGE_LIMIT_SECS {
            return Err(EvalError::InvalidConfig(format!(
                "max_bundle_age_secs must be <= {}, got {}",
                MAX_BUNDLE_AGE_LIMIT_SECS, self.max_bundle_age_secs
            )));
        }
        Ok(())
    }

    pub fn max_bundle_age(&self) -> Duration {
        Duration::seconds(self.max_bundle_age_secs as i64)
    }
}

// ---------------------------------------------------------------------------
// SessionEvaluator
// ---------------------------------------------------------------------------

/// Stateless evaluator; one instance serves every request.
#[derive(Debug, Clone, Default)]
pub struct SessionEvaluator {
    config: EvaluatorConfig,
}

impl SessionEvaluator {
    pub fn new(config: EvaluatorConfig) -> EvalResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Evaluate against the current time.
    pub fn evaluate(&self, payload: &DecryptedPayload, request_ip: &str) -> EvaluationResult {
        self.evaluate_at(payload, request_ip, Utc::now())
    }

    /// Evaluate with an explicit clock reading.
    pub fn evaluate_at(
        &self,
        payload: &DecryptedPayload,
        request_ip: &str,
        now: DateTime<Utc>,
    ) -> EvaluationResult {
        let outcomes = self.run_checks(payload, request_ip, now);
        let result = fold_outcomes(&outcomes);

        tracing::debug!(
            is_anon_session = result.is_anon_session(),
            anon_type = ?result.anon_type(),
            triggered = result.justifications().len(),
            "session evaluated"
        );
        result
    }

    /// Evaluate a payload that may not have been produced. The missing
    /// case is rejected before any check runs.
    pub fn evaluate_opened(
        &self,
        payload: Option<&DecryptedPayload>,
        request_ip: &str,
    ) -> EvalResult<EvaluationResult> {
        let payload = payload.ok_or(EvalError::MissingPayload)?;
        Ok(self.evaluate(payload, request_ip))
    }

    /// Run every check in order without folding.
    pub fn run_checks(
        &self,
        payload: &DecryptedPayload,
        request_ip: &str,
        now: DateTime<Utc>,
    ) -> [CheckOutcome; 4] {
        let cutoff = now - self.config.max_bundle_age();
        [
            check_completeness(payload),
            check_ip_consistency(payload, request_ip),
            check_timestamp(payload, cutoff),
            check_anonymization_flags(payload),
        ]
    }
}

/// Fold check outcomes into a verdict.
///
/// Justifications accumulate in order. `anon_type` is last-write-wins over
/// the outcomes that carry one; a triggered outcome without a type leaves
/// the running value alone.
pub fn fold_outcomes(outcomes: &[CheckOutcome]) -> EvaluationResult {
    let (anon_type, justifications) = outcomes
        .iter()
        .filter(|o| o.triggered)
        .fold((None, Vec::new()), |(anon_type, mut justifications), o| {
            if let Some(text) = &o.justification {
                justifications.push(text.clone());
            }
            (o.anon_type.or(anon_type), justifications)
        });
    EvaluationResult::from_parts(anon_type, justifications)
}
