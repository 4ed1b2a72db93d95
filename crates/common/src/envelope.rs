//! The versioned envelope wire format.
//!
//! An encrypted value is a single opaque string in one of three shapes:
//!
//! ```text
//! v2:<salt_b64>:<iv_b64>:<ciphertext_b64>:<mac_hex>    current
//! <iv_b64>:<ciphertext_b64>:<mac_hex>                  legacy v1
//! DEV.<base64>                                         legacy, insecure
//! ```
//!
//! Classification happens here, before any cryptographic work: an input is
//! parsed into exactly one [`Envelope`] variant or rejected as malformed.
//! This module is pure string handling — no key material is ever touched.
//!
//! The `v2` prefix enables future algorithm migration without breaking
//! existing ciphertext: a `v3` is a new variant here plus one decrypt
//! strategy in the engine crate.

use crate::error::CryptoError;

/// Prefix of the insecure development-only format.
pub const DEV_PREFIX: &str = "DEV.";

/// Prefix of the current format.
pub const V2_PREFIX: &str = "v2:";

/// Byte length of the per-encryption key-derivation salt.
pub const SALT_LEN: usize = 16;

/// Byte length of the CBC initialisation vector (one AES block).
pub const IV_LEN: usize = 16;

/// Format tag of a parsed envelope, for diagnostics and migration decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatVersion {
    /// `DEV.` — write-once legacy data, readable only in development builds.
    Dev,
    /// Bare three-segment legacy format with SHA-256 key derivation.
    V1,
    /// Current salted PBKDF2 format.
    V2,
}

/// A classified envelope. Segments are held in their encoded (base64/hex)
/// form; decoding is deferred to the decrypt strategies so that the MAC can
/// be recomputed over the exact received bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// `DEV.<base64>` — no integrity protection.
    Dev {
        /// Base64 payload after the `DEV.` prefix.
        payload: String,
    },
    /// `<iv_b64>:<ciphertext_b64>:<mac_hex>`.
    V1 {
        iv: String,
        ciphertext: String,
        mac: String,
    },
    /// `v2:<salt_b64>:<iv_b64>:<ciphertext_b64>:<mac_hex>`.
    V2 {
        salt: String,
        iv: String,
        ciphertext: String,
        mac: String,
    },
}

impl Envelope {
    /// Classify `input` into exactly one envelope variant.
    ///
    /// Dispatch is most-specific first: `DEV.`, then `v2:`, then the bare
    /// legacy shape. Segment counts are strict — a `v2:` body must have
    /// exactly 4 colon-delimited segments and a legacy body exactly 3.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedEnvelope`] when no variant matches.
    pub fn parse(input: &str) -> Result<Self, CryptoError> {
        if let Some(payload) = input.strip_prefix(DEV_PREFIX) {
            return Ok(Envelope::Dev {
                payload: payload.to_owned(),
            });
        }

        if let Some(body) = input.strip_prefix(V2_PREFIX) {
            let parts: Vec<&str> = body.split(':').collect();
            if parts.len() != 4 {
                return Err(CryptoError::MalformedEnvelope(format!(
                    "v2 envelope must have 4 segments after the prefix, got {}",
                    parts.len()
                )));
            }
            return Ok(Envelope::V2 {
                salt: parts[0].to_owned(),
                iv: parts[1].to_owned(),
                ciphertext: parts[2].to_owned(),
                mac: parts[3].to_owned(),
            });
        }

        let parts: Vec<&str> = input.split(':').collect();
        if parts.len() != 3 {
            return Err(CryptoError::MalformedEnvelope(format!(
                "legacy envelope must have 3 segments, got {}",
                parts.len()
            )));
        }
        Ok(Envelope::V1 {
            iv: parts[0].to_owned(),
            ciphertext: parts[1].to_owned(),
            mac: parts[2].to_owned(),
        })
    }

    /// The format tag of this envelope.
    pub fn version(&self) -> FormatVersion {
        match self {
            Envelope::Dev { .. } => FormatVersion::Dev,
            Envelope::V1 { .. } => FormatVersion::V1,
            Envelope::V2 { .. } => FormatVersion::V2,
        }
    }

    /// The exact string the integrity tag is computed over, or `None` for
    /// the unauthenticated `DEV.` format.
    pub fn mac_message(&self) -> Option<String> {
        match self {
            Envelope::Dev { .. } => None,
            Envelope::V1 { iv, ciphertext, .. } => Some(format!("{iv}:{ciphertext}")),
            Envelope::V2 {
                salt,
                iv,
                ciphertext,
                ..
            } => Some(format!("{salt}:{iv}:{ciphertext}")),
        }
    }

    /// The received integrity tag. Never trusted — always recomputed and
    /// compared by the decrypt path.
    pub fn mac(&self) -> Option<&str> {
        match self {
            Envelope::Dev { .. } => None,
            Envelope::V1 { mac, .. } | Envelope::V2 { mac, .. } => Some(mac),
        }
    }

    /// Render this envelope back to its wire string.
    pub fn encode(&self) -> String {
        match self {
            Envelope::Dev { payload } => format!("{DEV_PREFIX}{payload}"),
            Envelope::V1 {
                iv,
                ciphertext,
                mac,
            } => format!("{iv}:{ciphertext}:{mac}"),
            Envelope::V2 {
                salt,
                iv,
                ciphertext,
                mac,
            } => format!("{V2_PREFIX}{salt}:{iv}:{ciphertext}:{mac}"),
        }
    }
}

/// Whether `value` has the shape of an envelope this module can read.
///
/// Useful for callers holding columns that mix plaintext and ciphertext.
/// Note the legacy `v1` shape has no magic prefix, so any three-segment
/// colon-separated string classifies as encrypted.
pub fn is_encrypted(value: &str) -> bool {
    Envelope::parse(value).is_ok()
}
