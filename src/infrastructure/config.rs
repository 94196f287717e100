//! Harvester configuration: defaults, JSON file overrides, CLI knobs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::constants::{harvest, keywords};

/// Top-level configuration for a harvesting run.
///
/// Every field has a sensible default; a JSON config file may override any
/// subset, and CLI flags override the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Maximum concurrent fetch+extract units in flight.
    pub max_concurrent: usize,

    /// Accumulated records between snapshot flushes.
    pub batch_size: usize,

    /// HTTP request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// User agent sent with every request.
    pub user_agent: String,

    /// Directory holding the snapshot files.
    pub data_dir: PathBuf,

    /// Listing snapshot file name inside `data_dir`.
    pub listings_file: String,

    /// Detail snapshot file name inside `data_dir`.
    pub details_file: String,

    /// Course-code prefixes known to exceed the per-query truncation
    /// ceiling; each is partitioned into ten sub-queries. Empirical data,
    /// expected to shift with the catalog.
    pub edge_prefixes: Vec<u32>,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Logging configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: String,

    /// Enable console output.
    pub console_output: bool,

    /// Enable file output under `log_dir`.
    pub file_output: bool,

    /// Directory for log files.
    pub log_dir: PathBuf,

    /// Module-specific log level filters (e.g. "reqwest": "warn").
    pub module_filters: HashMap<String, String>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_concurrent: harvest::DEFAULT_MAX_CONCURRENT,
            batch_size: harvest::DEFAULT_BATCH_SIZE,
            request_timeout_seconds: harvest::DEFAULT_REQUEST_TIMEOUT_SECONDS,
            user_agent: harvest::DEFAULT_USER_AGENT.to_string(),
            data_dir: PathBuf::from(harvest::DEFAULT_DATA_DIR),
            listings_file: harvest::LISTINGS_FILE.to_string(),
            details_file: harvest::DETAILS_FILE.to_string(),
            edge_prefixes: keywords::EDGE_PREFIXES.to_vec(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_dir: PathBuf::from("logs"),
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "warn".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("html5ever".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

/// Where the effective configuration came from. `load_or_default` runs
/// before logging is initialized, so a missing file is reported here and
/// logged by the caller once a subscriber is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Defaults,
    File(PathBuf),
    /// A file was requested but does not exist; defaults are in effect.
    MissingFile(PathBuf),
}

impl HarvestConfig {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file is absent. A present-but-malformed file is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        match path {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                let config = serde_json::from_str(&raw)
                    .with_context(|| format!("invalid config file {}", path.display()))?;
                Ok((config, ConfigSource::File(path.to_path_buf())))
            }
            Some(path) => Ok((
                Self::default(),
                ConfigSource::MissingFile(path.to_path_buf()),
            )),
            None => Ok((Self::default(), ConfigSource::Defaults)),
        }
    }

    pub fn listings_path(&self) -> PathBuf {
        self.data_dir.join(&self.listings_file)
    }

    pub fn details_path(&self) -> PathBuf {
        self.data_dir.join(&self.details_file)
    }
}
