//! Keyed integrity tags and constant-time comparison.
//!
//! Tags are HMAC-SHA256 over the encoded envelope body, rendered as
//! lowercase hex. Every comparison of a received tag goes through
//! [`timing_safe_eq`] — no decrypt path may use ordinary string equality
//! on MACs.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use common::error::CryptoError;

use crate::kdf::DerivedKey;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex HMAC-SHA256 tag over `message`.
pub fn compute_tag(key: &DerivedKey, message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Recompute the tag for `message` and compare it to `received` in
/// constant time.
///
/// # Errors
///
/// Returns [`CryptoError::Integrity`] on mismatch. The received tag is
/// never trusted; it is only ever an input to this comparison.
pub fn verify_tag(key: &DerivedKey, message: &str, received: &str) -> Result<(), CryptoError> {
    let expected = compute_tag(key, message);
    if timing_safe_eq(&expected, received) {
        Ok(())
    } else {
        Err(CryptoError::Integrity)
    }
}

/// Constant-time string comparison.
///
/// Examines `max(len(a), len(b))` positions no matter where the inputs
/// first differ; out-of-range positions contribute zero. A length mismatch
/// feeds the accumulator the same way a content mismatch does, so neither
/// control flow nor operation count depends on the position of the first
/// difference. Returns true iff the accumulator is exactly zero.
pub fn timing_safe_eq(a: &str, b: &str) -> bool {
    let (acc, _) = diff_accumulator(a.as_bytes(), b.as_bytes());
    acc == 0
}

/// Accumulate the length-inequality signal and per-position XOR
/// differences. Returns the accumulator and the number of positions
/// examined; the latter exists so tests can check the operation-count
/// property without wall-clock timing.
fn diff_accumulator(a: &[u8], b: &[u8]) -> (usize, usize) {
    let positions = a.len().max(b.len());
    let mut acc = a.len() ^ b.len();
    for i in 0..positions {
        let x = *a.get(i).unwrap_or(&0) as usize;
        let y = *b.get(i).unwrap_or(&0) as usize;
        acc |= x ^ y;
    }
    (acc, positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::{DerivedKey, KEY_LEN};

    fn fixed_key(byte: u8) -> DerivedKey {
        DerivedKey::new([byte; KEY_LEN])
    }

    #[test]
    fn tag_is_64_hex_chars() {
        let tag = compute_tag(&fixed_key(1), "salt:iv:ct");
        assert_eq!(tag.len(), 64);
        assert!(tag.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(tag, tag.to_lowercase());
    }

    #[test]
    fn tag_binds_key_and_message() {
        let tag = compute_tag(&fixed_key(1), "a:b");
        assert_ne!(tag, compute_tag(&fixed_key(2), "a:b"));
        assert_ne!(tag, compute_tag(&fixed_key(1), "a:c"));
    }

    #[test]
    fn verify_accepts_correct_tag() {
        let key = fixed_key(7);
        let tag = compute_tag(&key, "body");
        assert!(verify_tag(&key, "body", &tag).is_ok());
    }

    #[test]
    fn verify_rejects_wrong_tag() {
        let key = fixed_key(7);
        let mut tag = compute_tag(&key, "body");
        let last = if tag.ends_with('0') { '1' } else { '0' };
        tag.pop();
        tag.push(last);
        assert!(matches!(
            verify_tag(&key, "body", &tag),
            Err(CryptoError::Integrity)
        ));
    }

    #[test]
    fn eq_only_for_identical_strings() {
        assert!(timing_safe_eq("", ""));
        assert!(timing_safe_eq("abc", "abc"));
        assert!(!timing_safe_eq("abc", "abd"));
        assert!(!timing_safe_eq("abc", "xbc"));
        assert!(!timing_safe_eq("abc", "abcd"));
        assert!(!timing_safe_eq("abcd", "abc"));
        assert!(!timing_safe_eq("", "a"));
    }

    #[test]
    fn trailing_zero_bytes_do_not_alias_shorter_string() {
        // The out-of-range-is-zero rule must not make "a\0" equal "a";
        // the length signal catches it.
        assert!(!timing_safe_eq("a\0", "a"));
    }

    #[test]
    fn positions_examined_independent_of_mismatch_location() {
        let base = "0123456789abcdef";
        let early = "X123456789abcdef";
        let late = "0123456789abcdeX";

        let (acc_early, n_early) = diff_accumulator(base.as_bytes(), early.as_bytes());
        let (acc_late, n_late) = diff_accumulator(base.as_bytes(), late.as_bytes());
        let (acc_eq, n_eq) = diff_accumulator(base.as_bytes(), base.as_bytes());

        assert_ne!(acc_early, 0);
        assert_ne!(acc_late, 0);
        assert_eq!(acc_eq, 0);
        // Work done is a function of length only, never of mismatch position.
        assert_eq!(n_early, base.len());
        assert_eq!(n_late, base.len());
        assert_eq!(n_eq, base.len());
    }

    #[test]
    fn positions_examined_covers_longer_input() {
        let (_, n) = diff_accumulator(b"abc", b"abcdefgh");
        assert_eq!(n, 8);
    }
}
