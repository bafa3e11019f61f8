use crate::error::MonocleResult;
use crate::types::DecryptedPayload;

// ---------------------------------------------------------------------------
// BundleOpener: turns an opaque threat bundle into a typed payload
//
// Implementations hold their key material immutably and must be safe to
// call from any number of request tasks at once.
// ---------------------------------------------------------------------------

pub trait BundleOpener: Send + Sync {
    fn open(&self, bundle: &str) -> MonocleResult<DecryptedPayload>;

    /// Short, non-secret identifier of the key this opener decrypts with.
    fn key_id(&self) -> String;
}
