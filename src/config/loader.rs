//! Configuration loading
//!
//! Files are merged key by key: user config, then project config. Environment
//! variables (`CRSHIP_*`) apply on top and CLI flags on top of that.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{DeployError, DeployResult};

use super::types::Config;

pub const PROJECT_CONFIG_FILE: &str = ".crship.toml";

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown config key '{}' in {}", self.key, self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> DeployResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path)?;
    let (config, warnings) = parse_with_warnings(&content, path)?;
    Ok((config, warnings))
}

fn parse_with_warnings(content: &str, path: &Path) -> DeployResult<(Config, Vec<ConfigWarning>)> {
    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(content);

    let config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| DeployError::Config {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                key: key.clone(),
                file: path.to_path_buf(),
                line: find_line_number(content, &key),
                suggestion: suggest_key(&key),
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Merge the given files in order (later wins) over the defaults.
///
/// Missing files are skipped. Unknown keys are reported per file.
pub fn load_layered(paths: &[PathBuf]) -> DeployResult<(Config, Vec<ConfigWarning>)> {
    let mut merged = toml::Value::Table(toml::map::Map::new());
    let mut warnings = Vec::new();

    for path in paths {
        if !path.is_file() {
            continue;
        }
        debug!(file = %path.display(), "loading config");
        let content = fs::read_to_string(path)?;

        // Type-check this file alone so errors and warnings name it
        let (_, file_warnings) = parse_with_warnings(&content, path)?;
        warnings.extend(file_warnings);

        let value: toml::Value = toml::from_str(&content).map_err(|e| DeployError::Config {
            file: path.clone(),
            message: e.to_string(),
        })?;
        merge_values(&mut merged, value);
    }

    let config: Config = merged.try_into().map_err(|e: toml::de::Error| DeployError::Config {
        file: paths.last().cloned().unwrap_or_default(),
        message: e.to_string(),
    })?;
    Ok((config, warnings))
}

/// Standard config locations: user config, then `<project>/.crship.toml`.
pub fn default_paths(project_root: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("crship").join("config.toml"));
    }
    if let Some(root) = project_root {
        paths.push(root.join(PROJECT_CONFIG_FILE));
    }
    paths
}

/// Load user and project config, then apply environment overrides.
pub fn load_for_project(project_root: Option<&Path>) -> DeployResult<(Config, Vec<ConfigWarning>)> {
    let (config, warnings) = load_layered(&default_paths(project_root))?;
    Ok((with_env_overrides(config), warnings))
}

/// Apply environment variable overrides (CRSHIP_* prefix)
pub fn with_env_overrides(config: Config) -> Config {
    apply_env(config, |key| std::env::var(key).ok())
}

/// Apply overrides from any variable source
pub fn apply_env(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    // CRSHIP_TOKEN
    if let Some(token) = lookup("CRSHIP_TOKEN").filter(|t| !t.trim().is_empty()) {
        config.env_token = Some(token.trim().to_string());
    }

    // CRSHIP_API_URL
    if let Some(url) = lookup("CRSHIP_API_URL").filter(|u| !u.trim().is_empty()) {
        config.api.url = url.trim().to_string();
    }

    // CRSHIP_SFTP_PORT
    if let Some(port) = lookup("CRSHIP_SFTP_PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => config.transfer.port = port,
            Err(_) => warn!(value = %port, "ignoring invalid CRSHIP_SFTP_PORT"),
        }
    }

    config
}

/// Recursively merge `overlay` into `base`; tables merge, everything else replaces.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    for (i, line) in content.lines().enumerate() {
        if line.contains(needle) {
            return Some(i + 1);
        }
    }
    None
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "api",
        "url",
        "token",
        "timeout_secs",
        "transfer",
        "port",
        "connect_timeout_secs",
        "io_timeout_secs",
        "connect_attempts",
        "file_attempts",
        "backoff_ms",
        "mtime_tolerance_secs",
        "unreliable_timestamps",
        "restart",
        "poll_interval_secs",
        "deploy",
        "remote_dir",
        "exclude",
        "respect_gitignore",
        "webapps",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] =
                std::cmp::min(std::cmp::min(prev[j + 1] + 1, curr[j] + 1), prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }

    prev[b_bytes.len()]
}
