use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

// Concat KDF (NIST SP 800-56A §5.8.1) as profiled by RFC 7518 §4.6.2.
//
// OtherInfo = AlgorithmID || PartyUInfo || PartyVInfo || SuppPubInfo
// where each of the first three is a big-endian u32 length followed by the
// bytes, and SuppPubInfo is the key length in bits as a big-endian u32.
// SuppPrivInfo is empty.

const HASH_LEN: usize = 32;

/// Derive `key_len_bits / 8` bytes of content-encryption key from the shared
/// secret `z`. `algorithm_id` is the `enc` value for direct key agreement.
pub fn concat_kdf(
    z: &[u8],
    algorithm_id: &str,
    apu: &[u8],
    apv: &[u8],
    key_len_bits: u32,
) -> Zeroizing<Vec<u8>> {
    let key_len = (key_len_bits / 8) as usize;
    let rounds = key_len.div_ceil(HASH_LEN);

    let mut other_info = Vec::with_capacity(16 + algorithm_id.len() + apu.len() + apv.len());
    push_length_prefixed(&mut other_info, algorithm_id.as_bytes());
    push_length_prefixed(&mut other_info, apu);
    push_length_prefixed(&mut other_info, apv);
    other_info.extend_from_slice(&key_len_bits.to_be_bytes());

    let mut derived = Zeroizing::new(Vec::with_capacity(rounds * HASH_LEN));
    for counter in 1..=rounds as u32 {
        let mut hasher = Sha256::new();
        hasher.update(counter.to_be_bytes());
        hasher.update(z);
        hasher.update(&other_info);
        derived.extend_from_slice(&hasher.finalize());
    }
    derived.truncate(key_len);
    derived
}

fn push_length_prefixed(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(data);
}
