use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use crship::Environment;

/// crship - deploy a local project to a managed web-app host
#[derive(Parser, Debug)]
#[command(name = "crship")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Logging can be tuned with CRSHIP_LOG, e.g. CRSHIP_LOG=crship=debug.")]
pub struct Cli {
    /// Emit NDJSON events on stdout instead of human output
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which webapp, where, and with what credentials
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Webapp handle
    pub handle: String,

    /// Environment to deploy to
    #[arg(short, long, default_value = "prod")]
    pub env: Environment,

    /// API token (overrides CRSHIP_TOKEN and config files)
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload changed files, run the deploy task and restart the app
    Deploy {
        #[command(flatten)]
        target: TargetArgs,

        /// Project directory
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Activate even if some files failed to upload
        #[arg(short, long)]
        force: bool,

        /// Show what would be uploaded; change nothing
        #[arg(long, conflicts_with = "no_upload")]
        dry_run: bool,

        /// Redeploy what is already on the server
        #[arg(long)]
        no_upload: bool,

        /// Remove remote files that no longer exist locally
        #[arg(long)]
        delete: bool,

        /// Deploy without asking when the project layout looks wrong
        #[arg(short, long)]
        yes: bool,
    },

    /// Upload a file or directory without deploying or restarting
    Upload {
        #[command(flatten)]
        target: TargetArgs,

        /// Local file or directory
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Remote directory (defaults to the configured deploy directory)
        #[arg(short, long)]
        remote: Option<String>,

        /// Show what would be uploaded; change nothing
        #[arg(long)]
        dry_run: bool,

        /// Remove remote files that no longer exist locally
        #[arg(long)]
        delete: bool,

        /// Upload into the app directory without asking when the layout looks wrong
        #[arg(short, long)]
        yes: bool,
    },

    /// Restart the app and wait until the host confirms it
    Restart {
        #[command(flatten)]
        target: TargetArgs,
    },
}

impl Commands {
    pub fn target(&self) -> &TargetArgs {
        match self {
            Commands::Deploy { target, .. }
            | Commands::Upload { target, .. }
            | Commands::Restart { target } => target,
        }
    }
}
