//! crship CLI - deploy a local project to a managed web-app host
//!
//! Usage: crship <COMMAND>
//!
//! Commands:
//!   deploy   Upload changed files, run the deploy task and restart the app
//!   upload   Upload a file or directory without deploying
//!   restart  Restart the app and wait for confirmation

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, warn};

mod cli;
mod commands;
mod logging;
mod ui;

use cli::Cli;
use commands::Context;
use crship::{CancelToken, DeployError};

/// Exit code for a run the user stopped (Ctrl-C or declining a prompt)
const EXIT_CANCELLED: u8 = 2;

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<DeployError>() {
        Some(e) if e.is_user_cancel() => EXIT_CANCELLED,
        _ => 1,
    }
}

/// React to one Ctrl-C. Never exits the process: the run unwinds on its own
/// so the SSH session is always closed.
fn on_interrupt(cancel: &CancelToken) -> &'static str {
    if cancel.is_cancelled() {
        return "still stopping, closing the connection";
    }
    cancel.cancel();
    "interrupted, stopping the current transfer"
}

fn install_interrupt_handler(cancel: CancelToken) {
    let result = ctrlc::set_handler(move || {
        eprintln!("\n{}", on_interrupt(&cancel));
    });
    if let Err(e) = result {
        warn!(error = %e, "could not install Ctrl-C handler");
    }
}

fn run(cli: &Cli, ctx: &Context) -> Result<()> {
    debug!(
        webapp = %cli.command.target().handle,
        env = %cli.command.target().env,
        "crship {}",
        env!("CARGO_PKG_VERSION")
    );
    commands::run(&cli.command, ctx)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let caps = ui::terminal::detect_capabilities();
    logging::init(cli.verbose, caps.supports_color);

    let cancel = CancelToken::new();
    install_interrupt_handler(cancel.clone());

    let ctx = Context {
        json: cli.json,
        verbose: cli.verbose,
        caps,
        cancel,
    };

    match run(&cli, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = exit_code(&err);
            if code == EXIT_CANCELLED {
                eprintln!("{}", err);
            } else {
                let icon = ui::theme::Icon::Error.colored(caps.supports_color, caps.supports_unicode);
                eprintln!("{} error: {:#}", icon, err);
            }
            ExitCode::from(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_and_decline_exit_with_two() {
        let cancelled = anyhow::Error::from(DeployError::Cancelled);
        assert_eq!(exit_code(&cancelled), 2);
        let declined = anyhow::Error::from(DeployError::Declined);
        assert_eq!(exit_code(&declined), 2);
    }

    #[test]
    fn repeated_interrupts_only_cancel() {
        let cancel = CancelToken::new();
        assert_eq!(on_interrupt(&cancel), "interrupted, stopping the current transfer");
        assert!(cancel.is_cancelled());
        assert_eq!(on_interrupt(&cancel), "still stopping, closing the connection");
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn other_failures_exit_with_one() {
        let err = anyhow::Error::from(DeployError::MissingToken {
            handle: "mysite".into(),
        });
        assert_eq!(exit_code(&err), 1);
    }
}
