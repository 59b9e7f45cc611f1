// Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::storage::DriverKind;

#[cfg(test)]
pub mod test_config;

#[cfg(test)]
pub use test_config::new_test_config;

pub const PROD: &str = "prod";
pub const TEST: &str = "test";

/// Default capacity for bounded drivers when the config omits one.
pub const DEFAULT_DRIVER_CAPACITY: usize = 10_000;

/// Root of the YAML document (`loader:` section).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Loader {
    #[serde(rename = "loader")]
    pub loader: LoaderBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoaderBox {
    pub env: String,
    pub logs: Option<Logs>,
    /// Freshness window; zero means a value never goes stale.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    /// How long a failed fetch is served before being retried. Falls back to `ttl`.
    #[serde(default, rename = "error_ttl", with = "humantime_serde")]
    pub error_ttl: Option<Duration>,
    pub driver: Option<Driver>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Driver {
    pub kind: DriverKind,
    pub capacity: Option<usize>,
}

/// Read-only accessors over the loaded configuration.
pub trait ConfigTrait {
    fn logs(&self) -> Option<&Logs>;
    fn is_prod(&self) -> bool;
    #[allow(dead_code)]
    fn is_test(&self) -> bool;
    fn ttl(&self) -> Duration;
    fn error_ttl(&self) -> Duration;
    fn driver_kind(&self) -> DriverKind;
    fn driver_capacity(&self) -> usize;
}

// Config type alias for convenience
pub type Config = Loader;

impl ConfigTrait for Config {
    fn logs(&self) -> Option<&Logs> {
        self.loader.logs.as_ref()
    }

    fn is_prod(&self) -> bool {
        self.loader.env == PROD
    }

    fn is_test(&self) -> bool {
        self.loader.env == TEST
    }

    fn ttl(&self) -> Duration {
        self.loader.ttl
    }

    fn error_ttl(&self) -> Duration {
        self.loader.error_ttl.unwrap_or(self.loader.ttl)
    }

    fn driver_kind(&self) -> DriverKind {
        self.loader
            .driver
            .as_ref()
            .map(|d| d.kind)
            .unwrap_or_default()
    }

    fn driver_capacity(&self) -> usize {
        self.loader
            .driver
            .as_ref()
            .and_then(|d| d.capacity)
            .unwrap_or(DEFAULT_DRIVER_CAPACITY)
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        Self::from_yaml(&data).with_context(|| format!("unmarshal yaml from {:?}", abs_path))
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(data)?;
        Ok(cfg)
    }
}
