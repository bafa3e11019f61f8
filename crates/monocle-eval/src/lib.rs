//! Monocle Session Evaluator
//!
//! Turns a decrypted threat bundle plus the request's client address into
//! an anonymized-session verdict. Four checks run in a fixed order:
//!
//! 1. completeness of the collector's evaluation
//! 2. consistency between the collector's address and the request address
//! 3. freshness of the bundle timestamp
//! 4. the collector's explicit anonymization flags (proxy, VPN)
//!
//! Each check yields a [`CheckOutcome`]; the verdict is a fold over the
//! outcomes in order, so the reported `anon_type` is the one set by the
//! last check that set any.

pub mod checks;
pub mod engine;
pub mod error;
pub mod ip;

pub use checks::{CheckKind, CheckOutcome};
pub use engine::{fold_outcomes, EvaluatorConfig, SessionEvaluator};
pub use error::{EvalError, EvalResult};
pub use ip::IpFamily;
