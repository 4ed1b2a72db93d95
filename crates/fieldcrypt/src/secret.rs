//! Secret provisioning.
//!
//! The engine never reads global state: the long-lived secret arrives
//! through the [`SecretProvider`] capability injected at construction.
//! Providers must fail when the secret is unset — there is no default
//! secret under any circumstance, since a compiled-in fallback would make
//! every stored envelope recoverable by anyone with the source code.

use std::env;
use std::fmt;

use common::error::CryptoError;

/// A secret value that zeroes its buffer on drop and redacts `Debug`.
pub struct SecretString {
    inner: String,
}

impl SecretString {
    /// Wrap a secret value.
    pub fn new(s: impl Into<String>) -> Self {
        Self { inner: s.into() }
    }

    /// Borrow the secret bytes. Use and drop promptly; never log.
    pub fn expose(&self) -> &str {
        &self.inner
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        // Zero the secret material on drop.
        // SAFETY: bytes are overwritten in place before the String is freed;
        // zero bytes keep the buffer valid UTF-8.
        unsafe {
            self.inner.as_bytes_mut().iter_mut().for_each(|b| *b = 0);
        }
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret material — not even in debug builds.
        f.write_str("SecretString([REDACTED])")
    }
}

/// Source of the long-lived encryption secret.
///
/// Called fresh on every encrypt/decrypt operation, so rotation within a
/// running process takes effect on the next call.
#[cfg_attr(test, mockall::automock)]
pub trait SecretProvider: Send + Sync {
    /// Fetch the secret.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Configuration`] when the secret is unset or
    /// empty. Implementations must not substitute a default.
    fn secret(&self) -> Result<SecretString, CryptoError>;
}

/// Reads the secret from an environment variable on every call.
pub struct EnvSecretProvider {
    var: String,
}

impl EnvSecretProvider {
    /// Provider backed by the environment variable named `var`.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl SecretProvider for EnvSecretProvider {
    fn secret(&self) -> Result<SecretString, CryptoError> {
        match env::var(&self.var) {
            Ok(value) if !value.trim().is_empty() => Ok(SecretString::new(value)),
            _ => Err(CryptoError::Configuration(format!(
                "encryption secret is not set ({} is missing or empty)",
                self.var
            ))),
        }
    }
}

/// Holds a fixed secret. For tests and embedders that manage configuration
/// themselves.
pub struct StaticSecretProvider {
    secret: String,
}

impl StaticSecretProvider {
    /// Provider that always returns `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl SecretProvider for StaticSecretProvider {
    fn secret(&self) -> Result<SecretString, CryptoError> {
        if self.secret.is_empty() {
            return Err(CryptoError::Configuration(
                "encryption secret is empty".into(),
            ));
        }
        Ok(SecretString::new(self.secret.clone()))
    }
}
