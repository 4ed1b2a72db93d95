//! Cryptographically secure random bytes.
//!
//! Thin wrapper over the OS CSPRNG. Both the key-derivation salt and the
//! CBC IV come from here; fresh randomness per encryption is what prevents
//! `(key, IV)` reuse, so nothing in this module may fall back to a
//! non-cryptographic generator.

use rand::rngs::OsRng;
use rand::RngCore;

use common::error::CryptoError;

/// Fill `n` bytes from the OS CSPRNG.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if the OS random source fails.
/// RNG failures are not transient and are never retried.
pub fn random_bytes(n: usize) -> Result<Vec<u8>, CryptoError> {
    let mut buf = vec![0u8; n];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|_| CryptoError::Encryption)?;
    Ok(buf)
}

/// Random bytes rendered as lowercase hex; exactly `2 * n` characters.
pub fn random_bytes_hex(n: usize) -> Result<String, CryptoError> {
    Ok(hex::encode(random_bytes(n)?))
}
