use std::path::Path;

use anyhow::Result;

use super::{run_deploy, Context};
use crate::cli::TargetArgs;
use crship::{DeployMode, DeployOptions};

pub fn cmd_restart(ctx: &Context, target: &TargetArgs) -> Result<()> {
    let project = Path::new(".");
    let options = DeployOptions::new(target.handle.clone(), project)
        .with_env(target.env)
        .with_mode(DeployMode::RestartOnly);
    run_deploy(ctx, target, project, options, true)
}
