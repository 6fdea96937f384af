//! Construction-time configuration for the FDR wrapper.
//!
//! Configuration is plain data (`serde`) and can be built in code, parsed
//! from a TOML file, or layered from `config/fdr.toml` plus `FDR_CI__*`
//! environment variables. Every path ends in [`FdrConfig::validate`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cutoff::{CutoffScope, FdrMethod};
use crate::error::{FdrError, FdrResult};

/// Default target false discovery rate.
pub const DEFAULT_TARGET_FDR: f64 = 0.05;

/// Environment variable prefix used by [`FdrConfig::load`].
pub const ENV_PREFIX: &str = "FDR_CI";

/// FDR wrapper configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FdrConfig {
    /// Step-up procedure (BH or BY)
    #[serde(default)]
    pub method: FdrMethod,
    /// Target FDR `q`, strictly inside (0, 1)
    #[serde(default = "default_target_fdr")]
    pub target_fdr: f64,
    /// Global cutoff or one per conditioning-set size
    #[serde(default)]
    pub scope: CutoffScope,
}

fn default_target_fdr() -> f64 {
    DEFAULT_TARGET_FDR
}

impl Default for FdrConfig {
    fn default() -> Self {
        Self {
            method: FdrMethod::default(),
            target_fdr: DEFAULT_TARGET_FDR,
            scope: CutoffScope::default(),
        }
    }
}

impl FdrConfig {
    pub fn new(method: FdrMethod, target_fdr: f64, scope: CutoffScope) -> Self {
        Self {
            method,
            target_fdr,
            scope,
        }
    }

    pub fn with_method(mut self, method: FdrMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_target_fdr(mut self, target_fdr: f64) -> Self {
        self.target_fdr = target_fdr;
        self
    }

    pub fn with_scope(mut self, scope: CutoffScope) -> Self {
        self.scope = scope;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// `FdrError::InvalidTargetFdr` unless `0 < target_fdr < 1` (NaN included).
    pub fn validate(&self) -> FdrResult<()> {
        if !(self.target_fdr > 0.0 && self.target_fdr < 1.0) {
            return Err(FdrError::invalid_target_fdr(self.target_fdr));
        }
        Ok(())
    }

    /// Load configuration from files and environment.
    ///
    /// Sources, later overriding earlier:
    /// 1. built-in defaults
    /// 2. `config/fdr.toml` (optional)
    /// 3. environment variables `FDR_CI__METHOD`, `FDR_CI__TARGET_FDR`, `FDR_CI__SCOPE`
    pub fn load() -> FdrResult<Self> {
        Self::load_from("config/fdr")
    }

    /// Same as [`FdrConfig::load`] with an explicit base file name (no extension).
    pub fn load_from(base: &str) -> FdrResult<Self> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("method", "benjamini_hochberg")?
            .set_default("target_fdr", defaults.target_fdr)?
            .set_default("scope", "global")?
            .add_source(config::File::with_name(base).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));

        let config: FdrConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> FdrResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FdrError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: FdrConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}
