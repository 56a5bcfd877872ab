//! Configuration type definitions

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DeployResult;

use super::loader::{self, ConfigWarning};

pub const DEFAULT_API_URL: &str = "https://app.codered.cloud/";
pub const DEFAULT_REMOTE_DIR: &str = "/www";

/// Control-plane API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

/// SFTP connection and upload tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub port: u16,
    pub connect_timeout_secs: u64,
    /// Limit for any single blocking SSH operation once connected
    pub io_timeout_secs: u64,
    pub connect_attempts: u32,
    pub file_attempts: u32,
    pub backoff_ms: u64,
    pub mtime_tolerance_secs: i64,
    /// Compare checksums instead of modification times
    pub unreliable_timestamps: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            port: 22,
            connect_timeout_secs: 15,
            io_timeout_secs: 60,
            connect_attempts: 3,
            file_attempts: 3,
            backoff_ms: 1000,
            mtime_tolerance_secs: 2,
            unreliable_timestamps: false,
        }
    }
}

/// Restart polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartConfig {
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            timeout_secs: 180,
        }
    }
}

/// Defaults for what gets deployed where
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub remote_dir: String,
    pub exclude: Vec<String>,
    pub respect_gitignore: bool,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            remote_dir: DEFAULT_REMOTE_DIR.to_string(),
            exclude: Vec::new(),
            respect_gitignore: true,
        }
    }
}

/// Per-webapp overrides under `[webapps.<handle>]`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebappConfig {
    pub token: Option<String>,
    pub remote_dir: Option<String>,
    pub exclude: Vec<String>,
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub transfer: TransferConfig,
    pub restart: RestartConfig,
    pub deploy: DeployConfig,
    pub webapps: BTreeMap<String, WebappConfig>,

    /// Token from `CRSHIP_TOKEN`; never read from or written to files
    #[serde(skip)]
    pub env_token: Option<String>,
}

impl Config {
    /// Load a single configuration file
    pub fn load(path: &Path) -> DeployResult<Self> {
        let (config, _warnings) = Self::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load a single file and report unknown keys
    pub fn load_with_warnings(path: &Path) -> DeployResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// Token for `handle`: explicit flag, then environment, then the
    /// webapp table, then `[api] token`.
    pub fn token_for(&self, handle: &str, explicit: Option<&str>) -> Option<String> {
        let usable = |t: &String| !t.trim().is_empty();
        explicit
            .map(str::to_string)
            .filter(usable)
            .or_else(|| self.env_token.clone().filter(usable))
            .or_else(|| {
                self.webapps
                    .get(handle)
                    .and_then(|w| w.token.clone())
                    .filter(usable)
            })
            .or_else(|| self.api.token.clone().filter(usable))
    }

    /// Remote directory for `handle`
    pub fn remote_dir_for(&self, handle: &str) -> String {
        self.webapps
            .get(handle)
            .and_then(|w| w.remote_dir.clone())
            .unwrap_or_else(|| self.deploy.remote_dir.clone())
    }

    /// Exclude patterns for `handle` (global first)
    pub fn excludes_for(&self, handle: &str) -> Vec<String> {
        let mut patterns = self.deploy.exclude.clone();
        if let Some(webapp) = self.webapps.get(handle) {
            patterns.extend(webapp.exclude.iter().cloned());
        }
        patterns
    }
}
