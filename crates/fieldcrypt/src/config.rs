//! Configuration loading and validation for the field encryption engine.
//!
//! All values are read from `FIELDCRYPT_`-prefixed environment variables at
//! startup. Loading fails with a clear error message if any value is
//! invalid; the secret itself is resolved lazily per call, never here.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::engine::FieldCrypt;
use crate::secret::EnvSecretProvider;

/// Build mode of the embedding application.
///
/// Gates the legacy unauthenticated `DEV.` format: only development builds
/// may decode it. Nothing else in the pipeline branches on this except
/// failure-detail logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    #[default]
    Production,
}

impl BuildMode {
    pub fn is_development(self) -> bool {
        self == BuildMode::Development
    }
}

/// Validated engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Name of the environment variable holding the encryption secret.
    /// The variable is read fresh on every operation, not cached here.
    #[serde(default = "default_secret_var")]
    pub secret_var: String,

    /// Build mode; `development` enables `DEV.` decoding and debug-level
    /// failure detail.
    #[serde(default)]
    pub build_mode: BuildMode,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_secret_var() -> String {
    "FIELDCRYPT_SECRET".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from `FIELDCRYPT_`-prefixed
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or a value fails
    /// validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("FIELDCRYPT"))
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.secret_var.trim().is_empty() {
            anyhow::bail!("FIELDCRYPT_SECRET_VAR must not be empty");
        }
        if self.log_level.trim().is_empty() {
            anyhow::bail!("FIELDCRYPT_LOG_LEVEL must not be empty");
        }
        Ok(())
    }

    /// Build a [`FieldCrypt`] engine backed by the configured environment
    /// secret variable.
    pub fn engine(&self) -> FieldCrypt {
        FieldCrypt::new(
            Arc::new(EnvSecretProvider::new(&self.secret_var)),
            self.build_mode,
        )
    }
}
