//! Key derivation: PBKDF2-HMAC-SHA256 for current envelopes, a single
//! SHA-256 pass for legacy `v1` data.
//!
//! There is deliberately no cache of derived keys: every operation re-runs
//! the full derivation, so the per-call salt keeps doing its job and a
//! rotated secret is picked up on the next call.

use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};

use crate::secret::SecretString;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count for `v2` envelopes.
///
/// Part of the wire contract: lowering it silently weakens every future
/// ciphertext, and raising it breaks decryption of existing `v2` data
/// unless the format version is bumped at the same time.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Fixed-size derived key buffer holding exactly [`KEY_LEN`] bytes.
///
/// The memory is overwritten with zeroes on drop to minimise the window
/// during which key material lives in RAM.
pub struct DerivedKey(Box<[u8; KEY_LEN]>);

impl DerivedKey {
    pub(crate) fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(Box::new(bytes))
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        // Zero the key material on drop.
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material — not even in debug builds.
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derive a key via PBKDF2-HMAC-SHA256 with [`PBKDF2_ITERATIONS`] rounds.
///
/// Deterministic in `(secret, salt)`; the per-encryption random salt makes
/// repeated use of the same secret yield unrelated keys.
pub fn derive_key_pbkdf2(secret: &SecretString, salt: &[u8]) -> DerivedKey {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(
        secret.expose().as_bytes(),
        salt,
        PBKDF2_ITERATIONS,
        &mut key,
    );
    DerivedKey::new(key)
}

/// Legacy derivation: SHA-256 of the secret, no salt, no stretching.
///
/// Retained solely to read pre-existing `v1` envelopes. Never used for new
/// encryptions.
pub fn derive_key_legacy(secret: &SecretString) -> DerivedKey {
    let digest = Sha256::digest(secret.expose().as_bytes());
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&digest);
    DerivedKey::new(key)
}
