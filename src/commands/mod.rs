//! Command handlers
//!
//! Each subcommand turns its flags into `DeployOptions`; `run_deploy` wires
//! the real adapters into the use case and reports the outcome.

mod deploy;
mod restart;
mod upload;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::cli::{Commands, TargetArgs};
use crate::ui::console::ConsoleEventSink;
use crate::ui::review::InteractiveReviewer;
use crate::ui::terminal::TerminalCapabilities;
use crate::ui::theme::Icon;
use crship::config::{load_for_project, Config};
use crship::domain::ports::{AcceptingReviewer, DeployEventSink, LayoutReviewer};
use crship::infrastructure::{FsProjectSource, HttpControlPlane, JsonEventSink, SftpTransport, SystemClock};
use crship::{CancelToken, DeployError, DeployOptions, DeploySettings, DeployUseCase};

/// Process-wide state shared by every command
pub struct Context {
    pub json: bool,
    pub verbose: u8,
    pub caps: TerminalCapabilities,
    pub cancel: CancelToken,
}

pub fn run(command: &Commands, ctx: &Context) -> Result<()> {
    match command {
        Commands::Deploy {
            target,
            path,
            force,
            dry_run,
            no_upload,
            delete,
            yes,
        } => deploy::cmd_deploy(
            ctx,
            target,
            path,
            deploy::Flags {
                force: *force,
                dry_run: *dry_run,
                no_upload: *no_upload,
                delete: *delete,
                yes: *yes,
            },
        ),
        Commands::Upload {
            target,
            path,
            remote,
            dry_run,
            delete,
            yes,
        } => upload::cmd_upload(
            ctx,
            target,
            path,
            upload::Flags {
                remote: remote.as_deref(),
                dry_run: *dry_run,
                delete: *delete,
                yes: *yes,
            },
        ),
        Commands::Restart { target } => restart::cmd_restart(ctx, target),
    }
}

/// Directory whose `.crship.toml` applies to `path`
fn project_root(path: &Path) -> PathBuf {
    if path.is_file() {
        path.parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        path.to_path_buf()
    }
}

fn load_config(ctx: &Context, project: &Path) -> Result<Config> {
    let (config, warnings) = load_for_project(Some(&project_root(project)))?;
    for warning in &warnings {
        if ctx.json {
            warn!("{}", warning);
        } else {
            let icon = Icon::Warning.colored(ctx.caps.supports_color, ctx.caps.supports_unicode);
            eprintln!("{} {}", icon, warning);
        }
    }
    Ok(config)
}

fn event_sink(ctx: &Context) -> Arc<dyn DeployEventSink> {
    if ctx.json {
        Arc::new(JsonEventSink::stdout())
    } else {
        Arc::new(ConsoleEventSink::stderr(ctx.caps, ctx.verbose > 0))
    }
}

fn reviewer(ctx: &Context, assume_yes: bool) -> Arc<dyn LayoutReviewer> {
    if assume_yes || ctx.json || !ctx.caps.can_prompt() {
        Arc::new(AcceptingReviewer)
    } else {
        Arc::new(InteractiveReviewer::new(ctx.caps))
    }
}

/// Build the adapters, run the use case and turn its outcome into a result.
pub(crate) fn run_deploy(
    ctx: &Context,
    target: &TargetArgs,
    project: &Path,
    options: DeployOptions,
    assume_yes: bool,
) -> Result<()> {
    let config = load_config(ctx, project)?;
    let token = config
        .token_for(&target.handle, target.token.as_deref())
        .ok_or_else(|| DeployError::MissingToken {
            handle: target.handle.clone(),
        })?;

    let api = HttpControlPlane::new(
        &config.api.url,
        &token,
        Duration::from_secs(config.api.timeout_secs),
    )
    .map_err(DeployError::from)?;
    let cancel = ctx.cancel.clone();
    let transport = SftpTransport::new(Duration::from_secs(config.transfer.connect_timeout_secs))
        .with_io_timeout(Duration::from_secs(config.transfer.io_timeout_secs))
        .with_interrupt(move || cancel.is_cancelled());
    let settings = DeploySettings::from_config(&config, &target.handle);
    debug!(api = %config.api.url, port = settings.sftp_port, remote = %settings.remote_dir, "settings");

    let use_case = DeployUseCase::new(
        transport,
        api,
        FsProjectSource::new(),
        settings,
        Arc::new(SystemClock),
    )
    .with_events(event_sink(ctx))
    .with_reviewer(reviewer(ctx, assume_yes))
    .with_cancel(ctx.cancel.clone());

    let outcome = use_case.execute(&options).into_result()?;

    if !ctx.json && !options.dry_run {
        if let Some(url) = &outcome.url {
            if outcome.upload.is_some() || outcome.restart.is_confirmed() {
                eprintln!("  {}", url);
            }
        }
    }
    Ok(())
}
