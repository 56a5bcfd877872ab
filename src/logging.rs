//! Diagnostic logging to stderr
//!
//! `-v` flags pick the default level; `CRSHIP_LOG` (an `EnvFilter` directive
//! string) wins when set.

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CRSHIP_LOG";

pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "crship=warn",
        1 => "crship=info",
        2 => "crship=debug",
        _ => "crship=trace",
    }
}

pub fn init(verbose: u8, color: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(color)
        .with_target(verbose >= 2)
        .without_time();

    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
}
