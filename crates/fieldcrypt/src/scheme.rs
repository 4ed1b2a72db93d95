//! Per-format decrypt strategies.
//!
//! Every authenticated format supplies the same three operations — derive
//! the key, verify the tag, open the ciphertext — looked up from a single
//! table. Adding a future `v3` format means one new [`Envelope`] variant
//! and one new entry here, with no changes to existing branches.
//!
//! The unauthenticated `DEV.` format has no entry: it is gated and handled
//! by the engine before any cryptographic work begins.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use common::envelope::Envelope;
use common::error::CryptoError;

use crate::block;
use crate::kdf::{self, DerivedKey};
use crate::mac;
use crate::secret::SecretString;

pub(crate) trait VersionScheme: Sync {
    /// Derive the decryption key for this format.
    fn derive(&self, secret: &SecretString, envelope: &Envelope)
        -> Result<DerivedKey, CryptoError>;

    /// Recompute the integrity tag over the envelope body and compare it to
    /// the received tag in constant time. Must pass before [`Self::open`]
    /// is called; there is no path that decrypts unverified data.
    fn verify(&self, key: &DerivedKey, envelope: &Envelope) -> Result<(), CryptoError> {
        match (envelope.mac_message(), envelope.mac()) {
            (Some(message), Some(received)) => mac::verify_tag(key, &message, received),
            // Unreachable for the formats registered here.
            _ => Err(CryptoError::Decryption),
        }
    }

    /// Decode and decrypt the payload. Only called after `verify` passes.
    fn open(&self, key: &DerivedKey, envelope: &Envelope) -> Result<String, CryptoError>;
}

/// Legacy three-segment format: key is SHA-256 of the secret.
pub(crate) struct V1Scheme;

/// Current salted format: key is PBKDF2 of the secret and the envelope salt.
pub(crate) struct V2Scheme;

/// Strategy lookup by format tag.
pub(crate) fn scheme_for(envelope: &Envelope) -> Option<&'static dyn VersionScheme> {
    match envelope {
        Envelope::V1 { .. } => Some(&V1Scheme),
        Envelope::V2 { .. } => Some(&V2Scheme),
        Envelope::Dev { .. } => None,
    }
}

impl VersionScheme for V1Scheme {
    fn derive(
        &self,
        secret: &SecretString,
        _envelope: &Envelope,
    ) -> Result<DerivedKey, CryptoError> {
        Ok(kdf::derive_key_legacy(secret))
    }

    fn open(&self, key: &DerivedKey, envelope: &Envelope) -> Result<String, CryptoError> {
        match envelope {
            Envelope::V1 { iv, ciphertext, .. } => open_cbc(key, iv, ciphertext),
            _ => Err(CryptoError::Decryption),
        }
    }
}

impl VersionScheme for V2Scheme {
    fn derive(
        &self,
        secret: &SecretString,
        envelope: &Envelope,
    ) -> Result<DerivedKey, CryptoError> {
        let Envelope::V2 { salt, .. } = envelope else {
            return Err(CryptoError::Decryption);
        };
        let salt = STANDARD.decode(salt).map_err(|e| {
            CryptoError::MalformedEnvelope(format!("salt segment is not valid base64: {e}"))
        })?;
        Ok(kdf::derive_key_pbkdf2(secret, &salt))
    }

    fn open(&self, key: &DerivedKey, envelope: &Envelope) -> Result<String, CryptoError> {
        match envelope {
            Envelope::V2 { iv, ciphertext, .. } => open_cbc(key, iv, ciphertext),
            _ => Err(CryptoError::Decryption),
        }
    }
}

/// Shared open path: base64-decode IV and ciphertext, CBC-decrypt, UTF-8.
/// Runs strictly after MAC verification, so failures here mean internal
/// inconsistency rather than tampering.
fn open_cbc(key: &DerivedKey, iv_b64: &str, ciphertext_b64: &str) -> Result<String, CryptoError> {
    let iv = STANDARD
        .decode(iv_b64)
        .map_err(|_| CryptoError::Decryption)?;
    let ciphertext = STANDARD
        .decode(ciphertext_b64)
        .map_err(|_| CryptoError::Decryption)?;
    let plaintext = block::decrypt(key, &iv, &ciphertext)?;
    String::from_utf8(plaintext).map_err(|_| CryptoError::Decryption)
}
