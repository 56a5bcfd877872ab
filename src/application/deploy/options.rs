//! Deploy Options
//!
//! Per-invocation options (from CLI flags) and settings derived from config.

use std::path::PathBuf;
use std::time::Duration;

use crate::application::restart::PollPolicy;
use crate::config::Config;
use crate::domain::services::{CompareConfig, RetryPolicy, TimestampPolicy};
use crate::domain::value_objects::Environment;

/// Which steps a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeployMode {
    /// Package, upload, activate, restart
    #[default]
    Full,
    /// Package and upload into any remote directory
    UploadOnly,
    /// Trigger and confirm a restart
    RestartOnly,
}

impl DeployMode {
    pub fn command_name(&self) -> &'static str {
        match self {
            DeployMode::Full => "deploy",
            DeployMode::UploadOnly => "upload",
            DeployMode::RestartOnly => "restart",
        }
    }
}

/// Options for the deploy use case
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Webapp handle
    pub handle: String,
    pub env: Environment,
    pub mode: DeployMode,
    /// Local project directory or single file
    pub source: PathBuf,
    /// Remote directory override
    pub remote_dir: Option<String>,
    /// Activate even if some files failed to upload
    pub force: bool,
    /// Survey and plan only; change nothing remotely
    pub dry_run: bool,
    /// Redeploy what is already on the server
    pub skip_upload: bool,
    /// Remove remote files that no longer exist locally
    pub delete: bool,
}

impl DeployOptions {
    pub fn new(handle: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            handle: handle.into(),
            env: Environment::default(),
            mode: DeployMode::default(),
            source: source.into(),
            remote_dir: None,
            force: false,
            dry_run: false,
            skip_upload: false,
            delete: false,
        }
    }

    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    pub fn with_mode(mut self, mode: DeployMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_remote_dir(mut self, dir: impl Into<String>) -> Self {
        self.remote_dir = Some(dir.into());
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_skip_upload(mut self, skip: bool) -> Self {
        self.skip_upload = skip;
        self
    }

    pub fn with_delete(mut self, delete: bool) -> Self {
        self.delete = delete;
        self
    }

    /// Whether the run packages and uploads files
    pub fn uploads(&self) -> bool {
        match self.mode {
            DeployMode::Full => !self.skip_upload || self.dry_run,
            DeployMode::UploadOnly => true,
            DeployMode::RestartOnly => false,
        }
    }
}

/// Tuning that comes from configuration rather than flags
#[derive(Debug, Clone)]
pub struct DeploySettings {
    pub sftp_port: u16,
    pub connect_retry: RetryPolicy,
    pub file_retry: RetryPolicy,
    pub compare: CompareConfig,
    pub poll: PollPolicy,
    pub remote_dir: String,
    pub exclude: Vec<String>,
    pub respect_gitignore: bool,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self::from_config(&Config::default(), "")
    }
}

impl DeploySettings {
    pub fn from_config(config: &Config, handle: &str) -> Self {
        let t = &config.transfer;
        let backoff = Duration::from_millis(t.backoff_ms);
        Self {
            sftp_port: t.port,
            connect_retry: RetryPolicy::default()
                .with_max_attempts(t.connect_attempts)
                .with_initial_backoff(backoff),
            file_retry: RetryPolicy::default()
                .with_max_attempts(t.file_attempts)
                .with_initial_backoff(backoff),
            compare: CompareConfig {
                mtime_tolerance_secs: t.mtime_tolerance_secs,
                timestamps: if t.unreliable_timestamps {
                    TimestampPolicy::Unreliable
                } else {
                    TimestampPolicy::Trusted
                },
            },
            poll: PollPolicy {
                interval: Duration::from_secs(config.restart.poll_interval_secs),
                timeout: Duration::from_secs(config.restart.timeout_secs),
            },
            remote_dir: config.remote_dir_for(handle),
            exclude: config.excludes_for(handle),
            respect_gitignore: config.deploy.respect_gitignore,
        }
    }
}
