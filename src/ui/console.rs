//! Human-readable progress on stderr

use std::io::{self, Write};
use std::sync::Mutex;

use crossterm::style::Stylize;

use crate::ui::terminal::TerminalCapabilities;
use crate::ui::theme::{self, Icon};
use crship::domain::ports::{DeployEvent, DeployEventSink};
use crship::domain::value_objects::DeployState;

pub struct ConsoleEventSink {
    caps: TerminalCapabilities,
    /// Print every skipped file and state change
    verbose: bool,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleEventSink {
    pub fn stderr(caps: TerminalCapabilities, verbose: bool) -> Self {
        Self {
            caps,
            verbose,
            writer: Mutex::new(Box::new(io::stderr())),
        }
    }

    #[cfg(test)]
    fn with_writer<W: Write + Send + 'static>(
        caps: TerminalCapabilities,
        verbose: bool,
        writer: W,
    ) -> Self {
        Self {
            caps,
            verbose,
            writer: Mutex::new(Box::new(writer)),
        }
    }

    fn icon(&self, icon: Icon) -> String {
        icon.colored(self.caps.supports_color, self.caps.supports_unicode)
    }

    fn line(&self, text: String) {
        if let Ok(mut w) = self.writer.lock() {
            let _ = writeln!(w, "{}", text);
            let _ = w.flush();
        }
    }

    fn render(&self, event: DeployEvent) -> Option<String> {
        let color = self.caps.supports_color;
        let text = match event {
            DeployEvent::Started {
                command,
                webapp,
                env,
                source,
                remote,
            } => {
                let title = format!("crship {} {} ({})", command, webapp, env);
                let title = if color {
                    title.bold().to_string()
                } else {
                    title
                };
                format!(
                    "{}\n  {} {} -> {}",
                    title,
                    self.icon(Icon::Arrow),
                    source.display(),
                    remote
                )
            }
            DeployEvent::StateChanged { to, .. } => {
                if !self.verbose || to.is_terminal() {
                    return None;
                }
                format!("{} {}", self.icon(Icon::Progress), to)
            }
            DeployEvent::Packaged {
                file_count,
                total_bytes,
            } => format!(
                "{} packaged {} files ({})",
                self.icon(Icon::Success),
                file_count,
                theme::format_bytes(total_bytes)
            ),
            DeployEvent::LayoutWarning { message, .. } => {
                format!("{} {}", self.icon(Icon::Warning), message)
            }
            DeployEvent::Planned {
                upload,
                skip,
                delete,
                bytes,
                ..
            } => {
                let mut text = format!(
                    "{} {} to upload ({}), {} unchanged",
                    self.icon(Icon::Progress),
                    upload,
                    theme::format_bytes(bytes),
                    skip
                );
                if delete > 0 {
                    text.push_str(&format!(", {} to delete", delete));
                }
                text
            }
            DeployEvent::DirectoryCreated { path } => {
                if !self.verbose {
                    return None;
                }
                format!("  {} mkdir {}", self.icon(Icon::Arrow), path)
            }
            DeployEvent::FileStarted { .. } => return None,
            DeployEvent::FileUploaded { index, path, bytes } => format!(
                "  {} {} {}",
                self.icon(Icon::Success),
                path,
                theme::dim(
                    &format!("#{} {}", index + 1, theme::format_bytes(bytes)),
                    color
                )
            ),
            DeployEvent::FileSkipped { path, reason } => {
                if !self.verbose {
                    return None;
                }
                format!("  {} {}", theme::dim("=", color), theme::dim(&format!("{} ({})", path, reason), color))
            }
            DeployEvent::FileRetrying {
                path,
                attempt,
                error,
                delay_ms,
            } => format!(
                "  {} {} attempt {} failed: {} (retrying in {} ms)",
                self.icon(Icon::Retry),
                path,
                attempt,
                error,
                delay_ms
            ),
            DeployEvent::FileFailed {
                path,
                attempts,
                error,
            } => format!(
                "  {} {} failed after {} attempt(s): {}",
                self.icon(Icon::Error),
                path,
                attempts,
                error
            ),
            DeployEvent::FileDeleted { path } => {
                format!("  {} {}", self.icon(Icon::Trash), path)
            }
            DeployEvent::UploadAborted { reason } => {
                format!("{} upload aborted: {}", self.icon(Icon::Error), reason)
            }
            DeployEvent::Warning { message } => {
                format!("{} {}", self.icon(Icon::Warning), message)
            }
            DeployEvent::TaskQueued { kind, task_id } => format!(
                "{} {} task queued {}",
                self.icon(Icon::Progress),
                kind,
                theme::dim(&format!("(#{})", task_id), color)
            ),
            DeployEvent::RestartConfirmed { waited_secs, .. } => format!(
                "{} restart confirmed after {}s",
                self.icon(Icon::Success),
                waited_secs
            ),
            DeployEvent::RestartTimedOut {
                task_id,
                waited_secs,
            } => format!(
                "{} uploaded, but restart task {} was not confirmed after {}s",
                self.icon(Icon::Warning),
                task_id,
                waited_secs
            ),
            DeployEvent::Completed {
                state,
                uploaded,
                skipped,
                failed,
                deleted,
                dry_run,
            } => {
                let icon = match (state, failed) {
                    (DeployState::Done, 0) => Icon::Success,
                    (DeployState::Done, _) => Icon::Warning,
                    _ => Icon::Error,
                };
                let verb = if dry_run { "would upload" } else { "uploaded" };
                let mut text = format!(
                    "{} {}: {} {}, skipped {}, failed {}",
                    self.icon(icon),
                    state,
                    verb,
                    uploaded,
                    skipped,
                    failed
                );
                if deleted > 0 {
                    let verb = if dry_run { "would delete" } else { "deleted" };
                    text.push_str(&format!(", {} {}", verb, deleted));
                }
                text
            }
        };
        Some(text)
    }
}

impl DeployEventSink for ConsoleEventSink {
    fn on_event(&self, event: DeployEvent) {
        if let Some(text) = self.render(event) {
            self.line(text);
        }
    }
}
