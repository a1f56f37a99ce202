//! CLI configuration: defaults, overridable by `tsdb.toml` and `TSDB_*`
//! environment variables.
//!
//! Priority (highest to lowest): environment variables, config file,
//! built-in defaults.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tsdb_core::FmvOptions;

/// Storage tunables exposed to the CLI's config layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Virtual address reservation per table, in bytes.
    pub reservation_bytes: u64,
    /// Elements preallocated when a table file is created fresh.
    pub initial_elements: u64,
    /// Multiplicative growth factor applied on each resize.
    pub growth_factor: u64,
    /// Unix file permission bits for newly created table files.
    pub file_mode: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let defaults = FmvOptions::default();
        Self {
            reservation_bytes: defaults.reservation_bytes,
            initial_elements: defaults.initial_elements,
            growth_factor: defaults.growth_factor,
            file_mode: defaults.file_mode,
        }
    }
}

impl From<StorageConfig> for FmvOptions {
    fn from(cfg: StorageConfig) -> Self {
        Self {
            reservation_bytes: cfg.reservation_bytes,
            initial_elements: cfg.initial_elements,
            growth_factor: cfg.growth_factor,
            file_mode: cfg.file_mode,
        }
    }
}

/// Top-level CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CliConfig {
    /// Storage tunables applied to every table this invocation opens.
    pub storage: StorageConfig,
}

impl CliConfig {
    /// Loads configuration from `tsdb.toml` in the current directory,
    /// layered with `TSDB_*` environment variables, layered over built-in
    /// defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from_path("tsdb.toml")
    }

    /// Loads configuration from a specific file path, which need not
    /// exist.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("TSDB_").split("_"));

        Ok(figment.extract()?)
    }
}
