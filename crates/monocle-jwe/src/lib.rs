//! # Monocle JWE
//!
//! Opens Monocle threat bundles: JOSE compact-serialized JWE tokens using
//! ECDH-ES direct key agreement on P-256 and A256GCM content encryption,
//! optionally DEFLATE-compressed.
//!
//! Opening flow:
//! 1. Strip line breaks and split the five compact segments.
//! 2. Check the protected header (`alg`, `enc`, `zip`, `crit`, `epk`).
//! 3. Derive the content key with ECDH and the Concat KDF.
//! 4. Decrypt and authenticate with AES-256-GCM.
//! 5. Inflate if requested, then decode the payload loosely.
//!
//! [`seal`] is the inverse, used to produce fixtures and test bundles.

pub mod cipher;
pub mod compact;
pub mod compression;
pub mod decrypt;
pub mod error;
pub mod header;
pub mod kdf;
pub mod key;
pub mod payload;
pub mod seal;

pub use decrypt::{decrypt, BundleDecryptor, DecryptorOptions};
pub use error::{JweError, JweResult};
pub use key::BundleKey;
pub use payload::decode_payload;
pub use seal::{seal, SealOptions};

pub use p256::PublicKey;
