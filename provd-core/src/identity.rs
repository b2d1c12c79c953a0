//! Correlation id derivation for provisioning requests.
//!
//! Audit rows are keyed by a numeric correlation id, but callers submit
//! free-form device ids. Numeric ids pass through verbatim; everything else
//! is reduced to a stable number so the same device always lands on the
//! same audit key, across restarts and releases.

use sha2::{Digest, Sha256};

/// Hash-derived ids are folded into this range so they stay in the same
/// order of magnitude as typical numeric device ids.
const HASH_ID_MODULUS: u64 = 100_000_000;

/// Resolve the correlation id for a device id.
///
/// A device id that parses as an integer is used as-is. Any other value is
/// hashed with SHA-256 and the first eight bytes (big-endian) are reduced
/// modulo 10^8, yielding a non-negative id in `[0, 100_000_000)`.
pub fn resolve_correlation_id(device_id: &str) -> i64 {
    if let Ok(numeric) = device_id.parse::<i64>() {
        return numeric;
    }

    let digest = Sha256::digest(device_id.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);

    (u64::from_be_bytes(prefix) % HASH_ID_MODULUS) as i64
}
