//! Store configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::segment::checked_segment;

/// Directory created under the system temp dir when no root is given
pub const DEFAULT_DIR_NAME: &str = "tempstore";

/// Where and under which namespace a store keeps its artifacts
///
/// ```toml
/// namespace = "plantuml"
/// root = "/var/tmp/wiki"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Shared root directory for all namespaces
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Namespace tag partitioning this store's artifacts
    pub namespace: String,
}

impl StoreConfig {
    /// Configuration for `namespace` under the default root
    #[inline]
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            root: default_root(),
            namespace: namespace.into(),
        }
    }

    /// With root directory
    #[inline]
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// With namespace
    #[inline]
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// Returns [`ConfigError`] if parsing or validation fails
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check namespace and root
    ///
    /// # Errors
    /// Returns [`ConfigError`] for an empty/oversized namespace or a
    /// relative root
    pub fn validate(&self) -> Result<(), ConfigError> {
        checked_segment("namespace", &self.namespace)?;
        if !self.root.is_absolute() {
            return Err(ConfigError::RelativeRoot(self.root.clone()));
        }
        Ok(())
    }
}

fn default_root() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_DIR_NAME)
}
