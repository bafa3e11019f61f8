use monocle_core::MonocleError;
use thiserror::Error;

/// Errors raised while loading keys or opening a bundle.
///
/// Display strings describe the structural problem only. They never echo
/// key bytes, derived secrets or decrypted plaintext.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JweError {
    #[error("malformed bundle: {0}")]
    MalformedBundle(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("bundle authentication failed")]
    AuthenticationFailure,

    #[error("payload decode error: {0}")]
    PayloadDecode(String),

    #[error("key material error: {0}")]
    KeyMaterial(String),
}

pub type JweResult<T> = Result<T, JweError>;

impl From<JweError> for MonocleError {
    fn from(e: JweError) -> Self {
        match e {
            JweError::MalformedBundle(msg) => MonocleError::MalformedBundle(msg),
            JweError::UnsupportedAlgorithm(msg) => MonocleError::UnsupportedAlgorithm(msg),
            JweError::AuthenticationFailure => MonocleError::AuthenticationFailure,
            JweError::PayloadDecode(msg) => MonocleError::PayloadDecode(msg),
            JweError::KeyMaterial(msg) => MonocleError::KeyMaterial(msg),
        }
    }
}
