//! `fieldcrypt` — authenticated encryption for individual field values.
//!
//! Encrypts single strings into self-describing envelope strings and reads
//! them back, with tamper detection and backward compatibility for two
//! older formats. The current format is:
//!
//! ```text
//! v2:<salt_b64>:<iv_b64>:<ciphertext_b64>:<mac_hex>
//! ```
//!
//! where the key is PBKDF2-HMAC-SHA256 of the configured secret and a
//! per-encryption random salt, the payload is AES-256-CBC with PKCS7
//! padding, and the tag is HMAC-SHA256 over the encoded body
//! (encrypt-then-MAC).
//!
//! The engine holds no state between calls: every operation fetches the
//! secret from the injected [`SecretProvider`] and re-derives the key, so
//! concurrent calls never interact and secret rotation takes effect on the
//! next operation.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fieldcrypt::{BuildMode, FieldCrypt, StaticSecretProvider};
//!
//! let engine = FieldCrypt::new(
//!     Arc::new(StaticSecretProvider::new("long-lived secret")),
//!     BuildMode::Production,
//! );
//! let envelope = engine.encrypt("tenant phone number")?;
//! let plaintext = engine.decrypt(&envelope)?;
//! ```

pub mod block;
pub mod config;
pub mod engine;
pub mod kdf;
pub mod mac;
pub mod rng;
pub mod secret;
pub mod telemetry;

mod scheme;

pub use common::envelope::{self, Envelope, FormatVersion};
pub use common::error::CryptoError;
pub use config::{BuildMode, Config};
pub use engine::FieldCrypt;
pub use secret::{EnvSecretProvider, SecretProvider, SecretString, StaticSecretProvider};
