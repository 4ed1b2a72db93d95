//! Error taxonomy for encrypt/decrypt operations.
//!
//! Every failure surfaces as an error to the caller; nothing is swallowed or
//! converted to a sentinel empty string, since a silently-empty plaintext
//! could mask a security failure. None of these conditions are retried — bad
//! configuration and bad data are permanent, and a MAC mismatch fails the
//! same way on every attempt.

use thiserror::Error;

/// Top-level error type for the encryption module.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The encryption secret is unavailable or the configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The envelope string does not match any recognised prefix or segment
    /// count. Signals corrupt storage or a format this build does not know.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// MAC verification failed. Callers must treat this as a security event,
    /// not a transient fault.
    #[error("integrity check failed: envelope tampered or corrupted")]
    Integrity,

    /// A `DEV.` envelope was presented outside a development build.
    #[error("insecure legacy format rejected outside development builds")]
    InsecureFormat,

    /// Unexpected failure in the encrypt pipeline. The message is sanitised;
    /// internal detail is logged only in development builds.
    #[error("encryption failed")]
    Encryption,

    /// Unexpected failure in the decrypt pipeline. The message is sanitised;
    /// internal detail is logged only in development builds.
    #[error("decryption failed")]
    Decryption,
}

impl CryptoError {
    /// Whether this error indicates possible tampering rather than a local
    /// configuration or data problem.
    pub fn is_security_event(&self) -> bool {
        matches!(self, CryptoError::Integrity | CryptoError::InsecureFormat)
    }
}
