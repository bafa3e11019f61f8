use monocle_core::{MonocleError, MonocleErrorKind};
use thiserror::Error;

/// Error type for the Monocle service and binary.
///
/// Bundle and evaluator failures arrive as [`MonocleError`]; everything
/// else is a request, configuration or process fault.
#[derive(Debug, Error)]
pub enum RootError {
    #[error("{0}")]
    Monocle(#[from] MonocleError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RootError {
    /// Kind of the wrapped bundle/evaluator error, if any.
    pub fn monocle_kind(&self) -> Option<MonocleErrorKind> {
        match self {
            RootError::Monocle(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// True when the caller sent a bundle that could not be opened.
    pub fn is_bundle_fault(&self) -> bool {
        self.monocle_kind().is_some_and(|k| k.is_bundle_fault())
    }
}

impl From<monocle_jwe::JweError> for RootError {
    fn from(e: monocle_jwe::JweError) -> Self {
        RootError::Monocle(e.into())
    }
}

impl From<monocle_eval::EvalError> for RootError {
    fn from(e: monocle_eval::EvalError) -> Self {
        RootError::Monocle(e.into())
    }
}

impl From<serde_json::Error> for RootError {
    fn from(e: serde_json::Error) -> Self {
        RootError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for RootError {
    fn from(e: toml::de::Error) -> Self {
        RootError::Config(format!("TOML parse error: {}", e))
    }
}

pub type RootResult<T> = Result<T, RootError>;
