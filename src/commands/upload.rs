use std::path::Path;

use anyhow::Result;

use super::{run_deploy, Context};
use crate::cli::TargetArgs;
use crship::{DeployMode, DeployOptions};

pub struct Flags<'a> {
    pub remote: Option<&'a str>,
    pub dry_run: bool,
    pub delete: bool,
    pub yes: bool,
}

pub fn cmd_upload(ctx: &Context, target: &TargetArgs, path: &Path, flags: Flags<'_>) -> Result<()> {
    let mut options = DeployOptions::new(target.handle.clone(), path)
        .with_env(target.env)
        .with_mode(DeployMode::UploadOnly)
        .with_dry_run(flags.dry_run)
        .with_delete(flags.delete);
    if let Some(remote) = flags.remote {
        options = options.with_remote_dir(remote);
    }
    // Uploads into the app directory get the same layout check as deploys
    run_deploy(ctx, target, path, options, flags.yes)
}
