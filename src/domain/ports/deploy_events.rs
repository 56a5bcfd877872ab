//! Deploy Event Port
//!
//! Provides an observable interface for deploy operations.
//! Enables progress reporting, JSON event streams, and debugging.

use std::path::PathBuf;

use crate::domain::value_objects::DeployState;

/// Event emitted during deploy operations
#[derive(Debug, Clone, PartialEq)]
pub enum DeployEvent {
    /// Deploy started
    Started {
        command: &'static str,
        webapp: String,
        env: String,
        source: PathBuf,
        remote: String,
    },

    /// The orchestrator moved to a new state
    StateChanged { from: DeployState, to: DeployState },

    /// Local project walked
    Packaged { file_count: usize, total_bytes: u64 },

    /// The project layout does not match the site type
    LayoutWarning { file: PathBuf, message: String },

    /// Remote compared against local
    Planned {
        upload: usize,
        skip: usize,
        delete: usize,
        directories: usize,
        bytes: u64,
    },

    DirectoryCreated { path: String },

    /// File transfer started
    FileStarted {
        index: usize,
        total: usize,
        path: String,
        size: u64,
    },

    /// File landed under its final name
    FileUploaded { index: usize, path: String, bytes: u64 },

    /// File was skipped (unchanged)
    FileSkipped { path: String, reason: String },

    /// A transfer attempt failed and will be retried
    FileRetrying {
        path: String,
        attempt: u32,
        error: String,
        delay_ms: u64,
    },

    /// File failed after exhausting its retries
    FileFailed {
        path: String,
        attempts: u32,
        error: String,
    },

    FileDeleted { path: String },

    /// Upload stopped before the end of the plan
    UploadAborted { reason: String },

    /// Something worth telling the user that does not fail the run
    Warning { message: String },

    /// A platform task was queued
    TaskQueued { kind: &'static str, task_id: u64 },

    RestartConfirmed { task_id: u64, waited_secs: u64 },

    RestartTimedOut { task_id: u64, waited_secs: u64 },

    /// Deploy completed
    Completed {
        state: DeployState,
        uploaded: usize,
        skipped: usize,
        failed: usize,
        deleted: usize,
        dry_run: bool,
    },
}

/// Trait for receiving deploy events
///
/// Implementations can be:
/// - ConsoleEventSink: Progress display in terminal
/// - JsonEventSink: NDJSON event stream for CI
/// - NoopEventSink: Silent operation
pub trait DeployEventSink: Send + Sync {
    /// Handle a deploy event
    fn on_event(&self, event: DeployEvent);

    /// Check if this sink wants detailed events (e.g., per-file)
    ///
    /// Some sinks may only want summary events.
    fn wants_detailed_events(&self) -> bool {
        true
    }
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl DeployEventSink for NoopEventSink {
    fn on_event(&self, _event: DeployEvent) {
        // Do nothing
    }

    fn wants_detailed_events(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Test event sink that records all events
    struct RecordingEventSink {
        events: Arc<Mutex<Vec<DeployEvent>>>,
    }

    impl DeployEventSink for RecordingEventSink {
        fn on_event(&self, event: DeployEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn recording_sink_captures_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingEventSink {
            events: events.clone(),
        };

        sink.on_event(DeployEvent::StateChanged {
            from: DeployState::Idle,
            to: DeployState::Packaging,
        });
        sink.on_event(DeployEvent::FileUploaded {
            index: 0,
            path: "index.html".to_string(),
            bytes: 120,
        });

        assert_eq!(events.lock().unwrap().len(), 2);
    }

    #[test]
    fn noop_sink_wants_no_details() {
        let sink = NoopEventSink;
        assert!(!sink.wants_detailed_events());
    }
}
