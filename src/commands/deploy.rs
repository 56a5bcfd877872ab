use std::path::Path;

use anyhow::Result;

use super::{run_deploy, Context};
use crate::cli::TargetArgs;
use crship::{DeployMode, DeployOptions};

/// `deploy` flags that shape the run
#[derive(Debug, Clone, Copy)]
pub struct Flags {
    pub force: bool,
    pub dry_run: bool,
    pub no_upload: bool,
    pub delete: bool,
    pub yes: bool,
}

pub fn cmd_deploy(ctx: &Context, target: &TargetArgs, path: &Path, flags: Flags) -> Result<()> {
    let options = DeployOptions::new(target.handle.clone(), path)
        .with_env(target.env)
        .with_mode(DeployMode::Full)
        .with_force(flags.force)
        .with_dry_run(flags.dry_run)
        .with_skip_upload(flags.no_upload)
        .with_delete(flags.delete);
    run_deploy(ctx, target, path, options, flags.yes)
}
