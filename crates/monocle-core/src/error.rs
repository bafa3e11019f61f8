use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error taxonomy shared across the workspace.
///
/// Display strings never carry key material or decrypted plaintext.
/// `AuthenticationFailure` deliberately has no detail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MonocleError {
    #[error("malformed bundle: {0}")]
    MalformedBundle(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("bundle authentication failed")]
    AuthenticationFailure,

    #[error("payload decode error: {0}")]
    PayloadDecode(String),

    #[error("no decrypted payload to evaluate")]
    MissingPayload,

    #[error("key material error: {0}")]
    KeyMaterial(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type MonocleResult<T> = Result<T, MonocleError>;

/// Variant tag for embedding in responses when only the kind matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonocleErrorKind {
    MalformedBundle,
    UnsupportedAlgorithm,
    AuthenticationFailure,
    PayloadDecode,
    MissingPayload,
    KeyMaterial,
    Config,
}

impl MonocleErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedBundle => "malformed_bundle",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::AuthenticationFailure => "authentication_failure",
            Self::PayloadDecode => "payload_decode",
            Self::MissingPayload => "missing_payload",
            Self::KeyMaterial => "key_material",
            Self::Config => "config",
        }
    }

    /// True for the kinds produced while opening a bundle. These are
    /// client-side faults (tampering or a broken collector), not server faults.
    pub fn is_bundle_fault(&self) -> bool {
        matches!(
            self,
            Self::MalformedBundle
                | Self::UnsupportedAlgorithm
                | Self::AuthenticationFailure
                | Self::PayloadDecode
        )
    }
}

impl fmt::Display for MonocleErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&MonocleError> for MonocleErrorKind {
    fn from(e: &MonocleError) -> Self {
        match e {
            MonocleError::MalformedBundle(_) => Self::MalformedBundle,
            MonocleError::UnsupportedAlgorithm(_) => Self::UnsupportedAlgorithm,
            MonocleError::AuthenticationFailure => Self::AuthenticationFailure,
            MonocleError::PayloadDecode(_) => Self::PayloadDecode,
            MonocleError::MissingPayload => Self::MissingPayload,
            MonocleError::KeyMaterial(_) => Self::KeyMaterial,
            MonocleError::Config(_) => Self::Config,
        }
    }
}

impl MonocleError {
    pub fn kind(&self) -> MonocleErrorKind {
        self.into()
    }
}
