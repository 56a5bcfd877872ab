//! JSON Event Sink
//!
//! Outputs deploy events as NDJSON for CI/automation consumption.

use crate::domain::ports::{DeployEvent, DeployEventSink};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::io::{self, Write};
use std::sync::Mutex;

/// Event sink that outputs NDJSON events to stdout
pub struct JsonEventSink {
    /// Mutex to ensure thread-safe writes
    writer: Mutex<Box<dyn Write + Send>>,
    timestamps: bool,
}

impl JsonEventSink {
    /// Create a new JSON event sink writing to stdout
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
            timestamps: true,
        }
    }

    /// Create a JSON event sink writing to a custom writer, without
    /// timestamps so output is stable
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            timestamps: false,
        }
    }

    fn write_event(&self, mut event: serde_json::Value) {
        if self.timestamps {
            if let Some(obj) = event.as_object_mut() {
                obj.insert(
                    "ts".to_string(),
                    json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
                );
            }
        }
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event);
            let _ = writer.flush();
        }
    }
}

/// Event payload, without the timestamp
pub fn event_json(event: &DeployEvent) -> serde_json::Value {
    match event {
        DeployEvent::Started {
            command,
            webapp,
            env,
            source,
            remote,
        } => json!({
            "event": "start",
            "command": command,
            "webapp": webapp,
            "env": env,
            "source": source.display().to_string(),
            "remote": remote,
        }),

        DeployEvent::StateChanged { from, to } => json!({
            "event": "state",
            "from": from.as_str(),
            "to": to.as_str(),
        }),

        DeployEvent::Packaged {
            file_count,
            total_bytes,
        } => json!({
            "event": "packaged",
            "files": file_count,
            "bytes": total_bytes,
        }),

        DeployEvent::LayoutWarning { file, message } => json!({
            "event": "layout_warning",
            "file": file.display().to_string(),
            "message": message,
        }),

        DeployEvent::Planned {
            upload,
            skip,
            delete,
            directories,
            bytes,
        } => json!({
            "event": "planned",
            "upload": upload,
            "skip": skip,
            "delete": delete,
            "directories": directories,
            "bytes": bytes,
        }),

        DeployEvent::DirectoryCreated { path } => json!({
            "event": "dir_created",
            "path": path,
        }),

        DeployEvent::FileStarted {
            index,
            total,
            path,
            size,
        } => json!({
            "event": "item_start",
            "index": index,
            "total": total,
            "path": path,
            "size": size,
        }),

        DeployEvent::FileUploaded { index, path, bytes } => json!({
            "event": "item_uploaded",
            "index": index,
            "path": path,
            "bytes": bytes,
        }),

        DeployEvent::FileSkipped { path, reason } => json!({
            "event": "item_skipped",
            "path": path,
            "reason": reason,
        }),

        DeployEvent::FileRetrying {
            path,
            attempt,
            error,
            delay_ms,
        } => json!({
            "event": "item_retry",
            "path": path,
            "attempt": attempt,
            "error": error,
            "delay_ms": delay_ms,
        }),

        DeployEvent::FileFailed {
            path,
            attempts,
            error,
        } => json!({
            "event": "item_error",
            "path": path,
            "attempts": attempts,
            "error": error,
        }),

        DeployEvent::FileDeleted { path } => json!({
            "event": "item_deleted",
            "path": path,
        }),

        DeployEvent::UploadAborted { reason } => json!({
            "event": "upload_aborted",
            "reason": reason,
        }),

        DeployEvent::Warning { message } => json!({
            "event": "warning",
            "message": message,
        }),

        DeployEvent::TaskQueued { kind, task_id } => json!({
            "event": "task_queued",
            "kind": kind,
            "task_id": task_id,
        }),

        DeployEvent::RestartConfirmed {
            task_id,
            waited_secs,
        } => json!({
            "event": "restart_confirmed",
            "task_id": task_id,
            "waited_secs": waited_secs,
        }),

        DeployEvent::RestartTimedOut {
            task_id,
            waited_secs,
        } => json!({
            "event": "restart_timeout",
            "task_id": task_id,
            "waited_secs": waited_secs,
        }),

        DeployEvent::Completed {
            state,
            uploaded,
            skipped,
            failed,
            deleted,
            dry_run,
        } => {
            let status = match (state.as_str(), *failed) {
                ("done", 0) => "success",
                ("done", _) => "partial",
                _ => "failed",
            };
            json!({
                "event": "complete",
                "status": status,
                "state": state.as_str(),
                "uploaded": uploaded,
                "skipped": skipped,
                "failed": failed,
                "deleted": deleted,
                "dry_run": dry_run,
            })
        }
    }
}

impl DeployEventSink for JsonEventSink {
    fn on_event(&self, event: DeployEvent) {
        self.write_event(event_json(&event));
    }

    fn wants_detailed_events(&self) -> bool {
        true // JSON mode wants all events
    }
}
