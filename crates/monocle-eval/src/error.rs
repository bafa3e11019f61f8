use monocle_core::MonocleError;
use thiserror::Error;

/// The evaluator has a single runtime failure: being asked to evaluate
/// without a payload. Missing or mistyped payload fields are not errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("no decrypted payload to evaluate")]
    MissingPayload,

    #[error("invalid evaluator configuration: {0}")]
    InvalidConfig(String),
}

pub type EvalResult<T> = Result<T, EvalError>;

impl From<EvalError> for MonocleError {
    fn from(e: EvalError) -> Self {
        match e {
            EvalError::MissingPayload => MonocleError::MissingPayload,
            EvalError::InvalidConfig(msg) => MonocleError::Config(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_payload_display() {
        assert_eq!(
            EvalError::MissingPayload.to_string(),
            "no decrypted payload to evaluate"
        );
    }

    #[test]
    fn test_conversion_to_monocle_error() {
        let e: MonocleError = EvalError::MissingPayload.into();
        assert_eq!(e, MonocleError::MissingPayload);
        let e: MonocleError = EvalError::InvalidConfig("zero window".into()).into();
        assert!(matches!(e, MonocleError::Config(msg) if msg == "zero window"));
    }
}
