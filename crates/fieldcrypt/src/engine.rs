//! The encrypt/decrypt engine: ties secret provisioning, key derivation,
//! the block cipher, and the tag layer together behind two operations.
//!
//! [`FieldCrypt`] presents encrypt and decrypt as atomic request/response
//! calls: no partial results, no cancellation, no shared mutable state.
//! Each call independently fetches the secret, draws fresh randomness, and
//! performs an isolated computation, so concurrent calls never interact.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, warn};

use common::envelope::{Envelope, SALT_LEN, V2_PREFIX};
use common::error::CryptoError;

use crate::block::{self, IV_LEN};
use crate::config::BuildMode;
use crate::kdf;
use crate::mac;
use crate::rng;
use crate::scheme;
use crate::secret::SecretProvider;

/// Field-level encryption engine.
///
/// Stateless between calls: every operation fetches the secret from the
/// injected provider and re-derives the key. There is deliberately no
/// derived-key cache — per-encryption salting is the point of the `v2`
/// format, and a cache keyed on the secret would defeat it.
pub struct FieldCrypt {
    secrets: Arc<dyn SecretProvider>,
    mode: BuildMode,
}

impl FieldCrypt {
    /// Build an engine from a secret source and the process build mode.
    pub fn new(secrets: Arc<dyn SecretProvider>, mode: BuildMode) -> Self {
        Self { secrets, mode }
    }

    /// Encrypt `plaintext` into a `v2` envelope string.
    ///
    /// A fresh 16-byte salt and 16-byte IV are drawn from the OS CSPRNG on
    /// every call, so encrypting the same plaintext twice yields different
    /// envelopes.
    ///
    /// # Errors
    ///
    /// [`CryptoError::Configuration`] when the secret is unset — checked
    /// before any randomness or cipher work. [`CryptoError::Encryption`]
    /// on any internal RNG/cipher failure; the message is sanitised and
    /// detail is logged at debug level in development builds only.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let secret = self.secrets.secret()?;

        let salt = rng::random_bytes(SALT_LEN)
            .map_err(|e| self.trace_failure("salt-generation", e))?;
        let key = kdf::derive_key_pbkdf2(&secret, &salt);
        let iv = rng::random_bytes(IV_LEN)
            .map_err(|e| self.trace_failure("iv-generation", e))?;

        let ciphertext = block::encrypt(&key, &iv, plaintext.as_bytes())
            .map_err(|e| self.trace_failure("cbc-encrypt", e))?;

        let body = format!(
            "{}:{}:{}",
            STANDARD.encode(&salt),
            STANDARD.encode(&iv),
            STANDARD.encode(&ciphertext),
        );
        let tag = mac::compute_tag(&key, &body);

        Ok(format!("{V2_PREFIX}{body}:{tag}"))
    }

    /// Decrypt an envelope string produced by any supported format.
    ///
    /// The input is classified first; `DEV.` payloads are gated on the
    /// build mode before any cryptographic work, and the authenticated
    /// formats verify their tag in constant time strictly before the
    /// cipher runs. There is no path that returns plaintext without a
    /// passing integrity check for `v1`/`v2`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::MalformedEnvelope`] for unrecognised shapes,
    /// [`CryptoError::InsecureFormat`] for `DEV.` outside a development
    /// build, [`CryptoError::Configuration`] when the secret is unset,
    /// [`CryptoError::Integrity`] on tag mismatch, and
    /// [`CryptoError::Decryption`] for internal pipeline failures.
    pub fn decrypt(&self, envelope: &str) -> Result<String, CryptoError> {
        let parsed = Envelope::parse(envelope)?;

        if let Envelope::Dev { payload } = &parsed {
            return self.open_dev(payload);
        }

        let secret = self.secrets.secret()?;
        // Every non-DEV variant has a scheme entry.
        let Some(scheme) = scheme::scheme_for(&parsed) else {
            return Err(CryptoError::Decryption);
        };

        let key = scheme.derive(&secret, &parsed)?;
        scheme.verify(&key, &parsed)?;
        scheme
            .open(&key, &parsed)
            .map_err(|e| self.trace_failure("open", e))
    }

    /// Decrypt any accepted envelope and re-encrypt it as `v2`.
    ///
    /// The explicit migration path for legacy `v1` (and, in development
    /// builds, `DEV.`) values. The caller persists the returned envelope;
    /// this module never writes anywhere itself.
    pub fn reencrypt(&self, envelope: &str) -> Result<String, CryptoError> {
        let plaintext = self.decrypt(envelope)?;
        self.encrypt(&plaintext)
    }

    fn open_dev(&self, payload: &str) -> Result<String, CryptoError> {
        if !self.mode.is_development() {
            return Err(CryptoError::InsecureFormat);
        }
        warn!("decrypted a legacy DEV-format value; re-encrypt it with the current format");
        let bytes = STANDARD
            .decode(payload)
            .map_err(|_| CryptoError::Decryption)
            .map_err(|e| self.trace_failure("dev-decode", e))?;
        String::from_utf8(bytes)
            .map_err(|_| CryptoError::Decryption)
            .map_err(|e| self.trace_failure("dev-utf8", e))
    }

    /// Record pipeline failure detail in development builds only, then pass
    /// the sanitised error through. Production logs never see internal
    /// stage names or error detail.
    fn trace_failure(&self, stage: &str, err: CryptoError) -> CryptoError {
        if self.mode.is_development() {
            debug!(stage, error = %err, "crypto pipeline failure");
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::{MockSecretProvider, StaticSecretProvider};

    const SECRET: &str = "unit-test secret with enough entropy";

    fn engine() -> FieldCrypt {
        FieldCrypt::new(
            Arc::new(StaticSecretProvider::new(SECRET)),
            BuildMode::Production,
        )
    }

    fn dev_engine() -> FieldCrypt {
        FieldCrypt::new(
            Arc::new(StaticSecretProvider::new(SECRET)),
            BuildMode::Development,
        )
    }

    /// Replace one character of `segment` (index into the colon-split wire
    /// string) with a different base64/hex character.
    fn flip_char(envelope: &str, segment: usize, pos: usize) -> String {
        let mut parts: Vec<String> = envelope.split(':').map(str::to_owned).collect();
        let mut chars: Vec<char> = parts[segment].chars().collect();
        chars[pos] = if chars[pos] == 'A' { 'B' } else { 'A' };
        parts[segment] = chars.into_iter().collect();
        parts.join(":")
    }

    #[test]
    fn round_trip_simple() {
        let e = engine();
        let envelope = e.encrypt("tenant phone: +1 555 0100").unwrap();
        assert_eq!(e.decrypt(&envelope).unwrap(), "tenant phone: +1 555 0100");
    }

    #[test]
    fn round_trip_empty_string() {
        let e = engine();
        let envelope = e.encrypt("").unwrap();
        assert_eq!(e.decrypt(&envelope).unwrap(), "");
    }

    #[test]
    fn round_trip_unicode() {
        let e = engine();
        let plaintext = "日本語 🏠 déjà vu ₪";
        let envelope = e.encrypt(plaintext).unwrap();
        assert_eq!(e.decrypt(&envelope).unwrap(), plaintext);
    }

    #[test]
    fn round_trip_large_plaintext() {
        let e = engine();
        let plaintext: String = "property notes ".repeat(200); // ~3 KB
        assert!(plaintext.len() > 1024);
        let envelope = e.encrypt(&plaintext).unwrap();
        assert_eq!(e.decrypt(&envelope).unwrap(), plaintext);
    }

    #[test]
    fn envelope_has_v2_prefix_and_five_fields() {
        let envelope = engine().encrypt("shape check").unwrap();
        assert!(envelope.starts_with("v2:"));
        assert_eq!(envelope.split(':').count(), 5);
    }

    #[test]
    fn successive_encrypts_differ() {
        let e = engine();
        let a = e.encrypt("same plaintext").unwrap();
        let b = e.encrypt("same plaintext").unwrap();
        assert_ne!(a, b);
        // Salt and IV segments are both fresh.
        let (sa, sb): (Vec<&str>, Vec<&str>) = (a.split(':').collect(), b.split(':').collect());
        assert_ne!(sa[1], sb[1]);
        assert_ne!(sa[2], sb[2]);
    }

    #[test]
    fn tampered_ciphertext_fails_integrity() {
        let e = engine();
        let envelope = e.encrypt("tamper me").unwrap();
        // Segment 3 is the ciphertext.
        let tampered = flip_char(&envelope, 3, 0);
        assert!(matches!(e.decrypt(&tampered), Err(CryptoError::Integrity)));
    }

    #[test]
    fn tampered_mac_fails_integrity() {
        let e = engine();
        let envelope = e.encrypt("tamper me").unwrap();
        let parts: Vec<&str> = envelope.split(':').collect();
        let mac = parts[4];
        let mut tampered_mac: Vec<char> = mac.chars().collect();
        tampered_mac[10] = if tampered_mac[10] == '0' { '1' } else { '0' };
        let tampered = format!(
            "{}:{}:{}:{}:{}",
            parts[0],
            parts[1],
            parts[2],
            parts[3],
            tampered_mac.into_iter().collect::<String>()
        );
        assert!(matches!(e.decrypt(&tampered), Err(CryptoError::Integrity)));
    }

    #[test]
    fn tampered_salt_fails_integrity() {
        let e = engine();
        let envelope = e.encrypt("salted").unwrap();
        let tampered = flip_char(&envelope, 1, 0);
        assert!(matches!(e.decrypt(&tampered), Err(CryptoError::Integrity)));
    }

    #[test]
    fn wrong_secret_fails_integrity_not_garbage() {
        let envelope = engine().encrypt("cross-secret").unwrap();
        let other = FieldCrypt::new(
            Arc::new(StaticSecretProvider::new("a different secret")),
            BuildMode::Production,
        );
        // The MAC key is derived from the secret, so a wrong secret is
        // indistinguishable from tampering.
        assert!(matches!(
            other.decrypt(&envelope),
            Err(CryptoError::Integrity)
        ));
    }

    #[test]
    fn v2_wrong_segment_counts_are_malformed() {
        let e = engine();
        for bad in ["v2:a:b:c", "v2:a:b:c:d:e"] {
            assert!(matches!(
                e.decrypt(bad),
                Err(CryptoError::MalformedEnvelope(_))
            ));
        }
    }

    fn build_v1_envelope(plaintext: &str) -> String {
        use crate::secret::SecretString;

        let secret = SecretString::new(SECRET);
        let key = kdf::derive_key_legacy(&secret);
        let iv = [0x24u8; IV_LEN];
        let ciphertext = block::encrypt(&key, &iv, plaintext.as_bytes()).unwrap();
        let body = format!("{}:{}", STANDARD.encode(iv), STANDARD.encode(&ciphertext));
        let tag = mac::compute_tag(&key, &body);
        format!("{body}:{tag}")
    }

    #[test]
    fn legacy_v1_envelope_decrypts() {
        let envelope = build_v1_envelope("stored before the v2 rollout");
        assert_eq!(
            engine().decrypt(&envelope).unwrap(),
            "stored before the v2 rollout"
        );
    }

    #[test]
    fn legacy_v1_with_bad_mac_fails_integrity() {
        let envelope = build_v1_envelope("stored before the v2 rollout");
        let parts: Vec<&str> = envelope.split(':').collect();
        let flipped = if parts[2].ends_with('0') { "1" } else { "0" };
        let tampered = format!(
            "{}:{}:{}{}",
            parts[0],
            parts[1],
            &parts[2][..parts[2].len() - 1],
            flipped
        );
        assert!(matches!(
            engine().decrypt(&tampered),
            Err(CryptoError::Integrity)
        ));
    }

    #[test]
    fn dev_format_accepted_in_development_only() {
        let payload = format!("DEV.{}", STANDARD.encode("seed fixture"));
        assert_eq!(dev_engine().decrypt(&payload).unwrap(), "seed fixture");
        assert!(matches!(
            engine().decrypt(&payload),
            Err(CryptoError::InsecureFormat)
        ));
    }

    #[test]
    fn dev_format_rejected_in_production_even_when_invalid() {
        // Gating fires before payload inspection.
        assert!(matches!(
            engine().decrypt("DEV.!!!not-base64!!!"),
            Err(CryptoError::InsecureFormat)
        ));
    }

    #[test]
    fn dev_format_bad_base64_fails_in_development() {
        assert!(matches!(
            dev_engine().decrypt("DEV.!!!not-base64!!!"),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn encrypt_never_emits_dev_format() {
        for _ in 0..8 {
            let envelope = engine().encrypt("anything").unwrap();
            assert!(!envelope.starts_with("DEV."));
            assert!(envelope.starts_with("v2:"));
        }
    }

    #[test]
    fn missing_secret_fails_before_any_crypto() {
        let mut provider = MockSecretProvider::new();
        provider.expect_secret().times(1).returning(|| {
            Err(CryptoError::Configuration("secret is not set".into()))
        });
        let e = FieldCrypt::new(Arc::new(provider), BuildMode::Production);
        assert!(matches!(
            e.encrypt("pt"),
            Err(CryptoError::Configuration(_))
        ));
    }

    #[test]
    fn missing_secret_fails_decrypt_of_valid_envelope() {
        let envelope = engine().encrypt("pt").unwrap();

        let mut provider = MockSecretProvider::new();
        provider.expect_secret().times(1).returning(|| {
            Err(CryptoError::Configuration("secret is not set".into()))
        });
        let e = FieldCrypt::new(Arc::new(provider), BuildMode::Production);
        assert!(matches!(
            e.decrypt(&envelope),
            Err(CryptoError::Configuration(_))
        ));
    }

    #[test]
    fn reencrypt_upgrades_v1_to_v2() {
        let e = engine();
        let legacy = build_v1_envelope("migrate me");
        let upgraded = e.reencrypt(&legacy).unwrap();
        assert!(upgraded.starts_with("v2:"));
        assert_eq!(e.decrypt(&upgraded).unwrap(), "migrate me");
    }

    #[test]
    fn reencrypt_of_v2_produces_fresh_envelope() {
        let e = engine();
        let original = e.encrypt("already current").unwrap();
        let refreshed = e.reencrypt(&original).unwrap();
        assert_ne!(original, refreshed);
        assert_eq!(e.decrypt(&refreshed).unwrap(), "already current");
    }
}
