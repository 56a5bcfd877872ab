//! NDJSON event stream shape
//!
//! Automation parses these lines, so field names and status values are
//! pinned with snapshots.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use insta::assert_snapshot;

use crship::domain::ports::{DeployEvent, DeployEventSink};
use crship::infrastructure::JsonEventSink;
use crship::DeployState;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn render(events: Vec<DeployEvent>) -> String {
    let buffer = SharedBuffer::default();
    let sink = JsonEventSink::with_writer(buffer.clone());
    for event in events {
        sink.on_event(event);
    }
    buffer.contents().trim_end().to_string()
}

#[test]
fn partial_deploy_stream() {
    let output = render(vec![
        DeployEvent::Started {
            command: "deploy",
            webapp: "mysite".into(),
            env: "prod".into(),
            source: PathBuf::from("/project"),
            remote: "/www".into(),
        },
        DeployEvent::StateChanged {
            from: DeployState::Idle,
            to: DeployState::Packaging,
        },
        DeployEvent::Planned {
            upload: 2,
            skip: 1,
            delete: 0,
            directories: 1,
            bytes: 2048,
        },
        DeployEvent::FileUploaded {
            index: 0,
            path: "index.html".into(),
            bytes: 1024,
        },
        DeployEvent::FileFailed {
            path: "app.py".into(),
            attempts: 3,
            error: "permission denied".into(),
        },
        DeployEvent::TaskQueued {
            kind: "restart",
            task_id: 7,
        },
        DeployEvent::Completed {
            state: DeployState::Done,
            uploaded: 1,
            skipped: 1,
            failed: 1,
            deleted: 0,
            dry_run: false,
        },
    ]);

    assert_snapshot!(output, @r#"
    {"command":"deploy","env":"prod","event":"start","remote":"/www","source":"/project","webapp":"mysite"}
    {"event":"state","from":"idle","to":"packaging"}
    {"bytes":2048,"delete":0,"directories":1,"event":"planned","skip":1,"upload":2}
    {"bytes":1024,"event":"item_uploaded","index":0,"path":"index.html"}
    {"attempts":3,"error":"permission denied","event":"item_error","path":"app.py"}
    {"event":"task_queued","kind":"restart","task_id":7}
    {"deleted":0,"dry_run":false,"event":"complete","failed":1,"skipped":1,"state":"done","status":"partial","uploaded":1}
    "#);
}

#[test]
fn failed_and_timed_out_runs() {
    let output = render(vec![
        DeployEvent::RestartTimedOut {
            task_id: 9,
            waited_secs: 120,
        },
        DeployEvent::UploadAborted {
            reason: "connection lost: socket closed".into(),
        },
        DeployEvent::Completed {
            state: DeployState::Failed,
            uploaded: 0,
            skipped: 0,
            failed: 0,
            deleted: 0,
            dry_run: true,
        },
    ]);

    assert_snapshot!(output, @r#"
    {"event":"restart_timeout","task_id":9,"waited_secs":120}
    {"event":"upload_aborted","reason":"connection lost: socket closed"}
    {"deleted":0,"dry_run":true,"event":"complete","failed":0,"skipped":0,"state":"failed","status":"failed","uploaded":0}
    "#);
}

#[test]
fn json_sink_asks_for_per_file_detail() {
    let sink = JsonEventSink::with_writer(io::sink());
    assert!(sink.wants_detailed_events());
}
