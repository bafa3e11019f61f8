//! Shared vocabulary for the Monocle verifier crates.
//!
//! The decryptor (`monocle-jwe`) produces a [`DecryptedPayload`], the
//! evaluator (`monocle-eval`) turns it into an [`EvaluationResult`], and the
//! root crate glues the two together behind the [`BundleOpener`] seam.

pub mod error;
pub mod traits;
pub mod types;

pub use error::*;
pub use traits::*;
pub use types::*;
