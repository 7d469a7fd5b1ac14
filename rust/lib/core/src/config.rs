use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::ServiceError;

/// Configuration shared by everything that opens the laundry store.
///
/// Built from defaults, parsed from command-line style arguments, or loaded
/// from a TOML file. Missing keys in the file keep their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory holding the store file.
    pub data_dir: Option<PathBuf>,

    /// Path to the redb database file.
    /// Defaults to `{data_dir}/laundry.redb` if not specified.
    pub db_path: Option<PathBuf>,

    /// Key namespace; every collection key is `{namespace}:{collection}`.
    pub namespace: String,

    /// Operator name recorded in history entries when the caller gives none.
    pub operator: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            db_path: None,
            namespace: "laundry".to_string(),
            operator: "sistema".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Parse configuration from command-line arguments.
    ///
    /// Supported flags:
    /// - `--data-dir=PATH`
    /// - `--db=PATH`
    /// - `--namespace=NAME`
    /// - `--operator=NAME`
    pub fn from_args(args: &[String]) -> Self {
        let mut config = ServiceConfig::default();

        for arg in args {
            if let Some(val) = arg.strip_prefix("--data-dir=") {
                config.data_dir = Some(PathBuf::from(val));
            } else if let Some(val) = arg.strip_prefix("--db=") {
                config.db_path = Some(PathBuf::from(val));
            } else if let Some(val) = arg.strip_prefix("--namespace=") {
                config.namespace = val.to_string();
            } else if let Some(val) = arg.strip_prefix("--operator=") {
                config.operator = val.to_string();
            }
        }

        config
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ServiceError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::Storage(format!("read config {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ServiceError> {
        let config: ServiceConfig = toml::from_str(content)
            .map_err(|e| ServiceError::Validation(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that can come from any source (file, flags, code).
    /// The namespace must be non-empty and free of `:`.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.namespace.is_empty() || self.namespace.contains(':') {
            return Err(ServiceError::Validation(format!(
                "invalid namespace '{}'",
                self.namespace
            )));
        }
        Ok(())
    }

    /// Resolve the redb database path, falling back to `{data_dir}/laundry.redb`.
    pub fn resolve_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.resolve_data_subpath("laundry.redb"))
    }

    fn resolve_data_subpath(&self, name: &str) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(|d| d.join(name))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}
