//! Configuration module for crship
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (CRSHIP_*)
//! 3. Project config (`<project>/.crship.toml`)
//! 4. User config (`~/.config/crship/config.toml`)
//! 5. Built-in defaults (lowest priority)

mod loader;
mod types;

pub use loader::{
    apply_env, default_paths, load_for_project, load_layered, with_env_overrides, ConfigWarning,
    PROJECT_CONFIG_FILE,
};
pub use types::{
    ApiConfig, Config, DeployConfig, RestartConfig, TransferConfig, WebappConfig,
    DEFAULT_API_URL, DEFAULT_REMOTE_DIR,
};
