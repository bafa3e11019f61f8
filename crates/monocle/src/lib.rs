//! Monocle Root Library
//!
//! Verifies Monocle threat bundles. A bundle is opened with the service's
//! private key, the decrypted payload is evaluated against the request's
//! client address, and the caller gets an anonymized-session verdict.
//!
//! # Architecture
//!
//! [`MonocleService`] is a thin orchestrator over two stateless parts: a
//! [`BundleOpener`] (normally [`monocle_jwe::BundleDecryptor`]) and a
//! [`SessionEvaluator`]. It is built once at startup and shared by every
//! request; nothing in it is mutable.

pub mod config;
pub mod error;
pub mod http;

pub use config::{DecryptorConfig, HttpConfig, KeyConfig, RootConfig};
pub use error::{RootError, RootResult};

pub use monocle_core::{AnonType, BundleOpener, DecryptedPayload, EvaluationResult};
pub use monocle_eval::{EvaluatorConfig, SessionEvaluator};
pub use monocle_jwe::{BundleDecryptor, BundleKey};

use std::sync::Arc;
use tracing::info;

// ---------------------------------------------------------------------------
// MonocleService
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MonocleService {
    opener: Arc<dyn BundleOpener>,
    evaluator: SessionEvaluator,
}

impl std::fmt::Debug for MonocleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonocleService")
            .field("key_id", &self.opener.key_id())
            .field("evaluator", &self.evaluator)
            .finish()
    }
}

impl MonocleService {
    pub fn new(opener: Arc<dyn BundleOpener>, evaluator: SessionEvaluator) -> Self {
        Self { opener, evaluator }
    }

    /// Build the service from configuration, loading the private key from
    /// `key.private_key_path`.
    pub fn from_config(config: &RootConfig) -> RootResult<Self> {
        config.validate()?;
        let key = BundleKey::load(&config.key.private_key_path)?;
        Self::with_key(key, config)
    }

    /// Build the service around an already-loaded key.
    pub fn with_key(key: BundleKey, config: &RootConfig) -> RootResult<Self> {
        let decryptor = BundleDecryptor::with_options(key, (&config.decryptor).into());
        let evaluator = SessionEvaluator::new(config.evaluator.clone())?;
        info!(
            key_id = %decryptor.key().key_id(),
            max_bundle_age_secs = config.evaluator.max_bundle_age_secs,
            "monocle service initialized"
        );
        Ok(Self::new(Arc::new(decryptor), evaluator))
    }

    pub fn key_id(&self) -> String {
        self.opener.key_id()
    }

    pub fn evaluator(&self) -> &SessionEvaluator {
        &self.evaluator
    }

    /// Open `bundle` and evaluate it against `client_ip`.
    ///
    /// Empty inputs are rejected before any decryption. Bundle failures
    /// surface as [`RootError::Monocle`] with a bundle-fault kind.
    pub fn verify_anon_mode(&self, bundle: &str, client_ip: &str) -> RootResult<EvaluationResult> {
        if bundle.trim().is_empty() {
            return Err(RootError::Validation("monocle_bundle is required".into()));
        }
        let client_ip = client_ip.trim();
        if client_ip.is_empty() {
            return Err(RootError::Validation("client IP is required".into()));
        }

        let payload = self.opener.open(bundle)?;
        let result = self.evaluator.evaluate_opened(Some(&payload), client_ip)?;

        info!(
            is_anon_session = result.is_anon_session(),
            anon_type = result.anon_type().map(|t| t.as_str()).unwrap_or("none"),
            justifications = result.justifications().len(),
            "bundle verified"
        );
        Ok(result)
    }
}
