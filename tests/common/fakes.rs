//! In-memory stand-ins for the network ports.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crship::application::{CancelToken, PART_SUFFIX};
use crship::domain::entities::Webapp;
use crship::domain::ports::{
    ApiError, ApiResult, Clock, ControlPlane, DeployEvent, DeployEventSink, EntryKind,
    RemoteConnection, RemoteEntry, RemoteStat, TaskId, TaskKind, TaskStatus, Transport,
    TransportError, TransportResult,
};
use crship::domain::value_objects::{Credentials, Environment, RemoteHost};

/// Clock that only moves when something sleeps on it
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        })
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        *self.offset.lock().unwrap() += duration;
        self.sleeps.lock().unwrap().push(duration);
    }
}

#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub data: Vec<u8>,
    pub mtime: Option<i64>,
}

/// State of the fake server, shared by every connection it hands out
#[derive(Default)]
pub struct RemoteState {
    pub files: BTreeMap<String, RemoteFile>,
    pub dirs: BTreeSet<String>,
    /// Every call, in order, e.g. `put /www/a.txt.crship-part`
    pub ops: Vec<String>,
    /// Uploads to these final paths always fail
    pub fail_puts: BTreeSet<String>,
    /// Uploads to these final paths fail this many more times
    pub flaky_puts: BTreeMap<String, u32>,
    /// Fail this many more connects with a network error
    pub connect_failures: u32,
    /// Accept the TCP connection but fail this many more SSH handshakes
    pub handshake_failures: u32,
    pub reject_auth: bool,
    /// Drop the connection on the next put
    pub drop_on_put: bool,
    /// Creating these directories always fails
    pub fail_mkdirs: BTreeSet<String>,
    /// Cancel this token part-way through the next put, as Ctrl-C would
    pub interrupt_put: Option<CancelToken>,
    pub connects: u32,
    pub closes: u32,
}

impl RemoteState {
    pub fn mutating_ops(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter(|op| {
                !op.starts_with("read_dir")
                    && !op.starts_with("stat")
                    && !op.starts_with("connect")
                    && !op.starts_with("close")
            })
            .cloned()
            .collect()
    }
}

fn parent_of(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) => "/",
        Some((parent, _)) => parent,
        None => "/",
    }
}

fn name_of(path: &str) -> String {
    path.rsplit('/').next().unwrap_or_default().to_string()
}

#[derive(Clone)]
pub struct FakeTransport {
    pub state: Rc<RefCell<RemoteState>>,
}

impl FakeTransport {
    /// Server with an empty `/www`
    pub fn new() -> Self {
        let mut state = RemoteState::default();
        state.dirs.insert("/".into());
        state.dirs.insert("/www".into());
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn with_file(self, path: &str, data: &[u8], mtime: Option<i64>) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let mut dir = parent_of(path).to_string();
            while dir != "/" {
                state.dirs.insert(dir.clone());
                dir = parent_of(&dir).to_string();
            }
            state.files.insert(
                path.to_string(),
                RemoteFile {
                    data: data.to_vec(),
                    mtime,
                },
            );
        }
        self
    }

    pub fn file(&self, path: &str) -> Option<RemoteFile> {
        self.state.borrow().files.get(path).cloned()
    }

    pub fn mutating_ops(&self) -> Vec<String> {
        self.state.borrow().mutating_ops()
    }

    pub fn connect_handle(&self) -> FakeConnection {
        FakeConnection {
            state: self.state.clone(),
            closed: Cell::new(false),
        }
    }
}

pub struct FakeConnection {
    state: Rc<RefCell<RemoteState>>,
    closed: Cell<bool>,
}

impl Transport for FakeTransport {
    type Connection = FakeConnection;

    fn connect(&self, host: &RemoteHost) -> TransportResult<FakeConnection> {
        let mut state = self.state.borrow_mut();
        state.ops.push(format!("connect {}", host));
        if state.connect_failures > 0 {
            state.connect_failures -= 1;
            return Err(TransportError::Connect(format!(
                "connection refused by {}",
                host
            )));
        }
        state.connects += 1;
        drop(state);
        Ok(self.connect_handle())
    }
}

impl FakeConnection {
    fn log(&self, op: String) {
        self.state.borrow_mut().ops.push(op);
    }
}

impl RemoteConnection for FakeConnection {
    fn handshake(&mut self) -> TransportResult<()> {
        let mut state = self.state.borrow_mut();
        if state.handshake_failures > 0 {
            state.handshake_failures -= 1;
            return Err(TransportError::Connect("connection reset during key exchange".into()));
        }
        Ok(())
    }

    fn authenticate(&mut self, credentials: &Credentials) -> TransportResult<()> {
        if self.state.borrow().reject_auth {
            return Err(TransportError::Auth(format!(
                "password rejected for {}",
                credentials.username
            )));
        }
        Ok(())
    }

    fn read_dir(&mut self, path: &str) -> TransportResult<Vec<RemoteEntry>> {
        self.log(format!("read_dir {}", path));
        let state = self.state.borrow();
        if !state.dirs.contains(path) {
            return Err(TransportError::NotFound(path.to_string()));
        }
        let mut entries = Vec::new();
        for (file, remote) in &state.files {
            if parent_of(file) == path {
                entries.push(RemoteEntry {
                    name: name_of(file),
                    stat: RemoteStat {
                        kind: EntryKind::File,
                        size: remote.data.len() as u64,
                        mtime: remote.mtime,
                    },
                });
            }
        }
        for dir in &state.dirs {
            if dir != path && dir != "/" && parent_of(dir) == path {
                entries.push(RemoteEntry {
                    name: name_of(dir),
                    stat: RemoteStat {
                        kind: EntryKind::Dir,
                        size: 0,
                        mtime: None,
                    },
                });
            }
        }
        Ok(entries)
    }

    fn stat(&mut self, path: &str) -> TransportResult<RemoteStat> {
        self.log(format!("stat {}", path));
        let state = self.state.borrow();
        if state.dirs.contains(path) {
            return Ok(RemoteStat {
                kind: EntryKind::Dir,
                size: 0,
                mtime: None,
            });
        }
        match state.files.get(path) {
            Some(f) => Ok(RemoteStat {
                kind: EntryKind::File,
                size: f.data.len() as u64,
                mtime: f.mtime,
            }),
            None => Err(TransportError::NotFound(path.to_string())),
        }
    }

    fn mkdir(&mut self, path: &str) -> TransportResult<()> {
        self.log(format!("mkdir {}", path));
        let mut state = self.state.borrow_mut();
        if state.fail_mkdirs.contains(path) {
            return Err(TransportError::File {
                path: path.to_string(),
                message: "permission denied".into(),
            });
        }
        if !state.dirs.contains(parent_of(path)) {
            return Err(TransportError::NotFound(parent_of(path).to_string()));
        }
        state.dirs.insert(path.to_string());
        Ok(())
    }

    fn put(&mut self, local: &Path, remote: &str) -> TransportResult<u64> {
        self.log(format!("put {}", remote));
        let target = remote.trim_end_matches(PART_SUFFIX).to_string();
        let mut state = self.state.borrow_mut();
        if state.drop_on_put {
            return Err(TransportError::ConnectionLost("socket closed".into()));
        }
        if let Some(cancel) = state.interrupt_put.take() {
            cancel.cancel();
            state
                .files
                .insert(remote.to_string(), RemoteFile { data: b"par".to_vec(), mtime: None });
            return Err(TransportError::Interrupted);
        }
        if state.fail_puts.contains(&target) {
            return Err(TransportError::File {
                path: remote.to_string(),
                message: "permission denied".into(),
            });
        }
        if let Some(left) = state.flaky_puts.get_mut(&target) {
            if *left > 0 {
                *left -= 1;
                return Err(TransportError::File {
                    path: remote.to_string(),
                    message: "write timed out".into(),
                });
            }
        }
        if !state.dirs.contains(parent_of(remote)) {
            return Err(TransportError::NotFound(parent_of(remote).to_string()));
        }
        let data = std::fs::read(local).map_err(|e| TransportError::File {
            path: local.display().to_string(),
            message: e.to_string(),
        })?;
        let len = data.len() as u64;
        state
            .files
            .insert(remote.to_string(), RemoteFile { data, mtime: None });
        Ok(len)
    }

    fn set_mtime(&mut self, path: &str, mtime: i64) -> TransportResult<()> {
        self.log(format!("set_mtime {}", path));
        let mut state = self.state.borrow_mut();
        match state.files.get_mut(path) {
            Some(f) => {
                f.mtime = Some(mtime);
                Ok(())
            }
            None => Err(TransportError::NotFound(path.to_string())),
        }
    }

    fn rename(&mut self, from: &str, to: &str) -> TransportResult<()> {
        self.log(format!("rename {} {}", from, to));
        let mut state = self.state.borrow_mut();
        let file = state
            .files
            .remove(from)
            .ok_or_else(|| TransportError::NotFound(from.to_string()))?;
        state.files.insert(to.to_string(), file);
        Ok(())
    }

    fn remove(&mut self, path: &str) -> TransportResult<()> {
        self.log(format!("remove {}", path));
        let mut state = self.state.borrow_mut();
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| TransportError::NotFound(path.to_string()))
    }

    fn close(&mut self) -> TransportResult<()> {
        if !self.closed.replace(true) {
            let mut state = self.state.borrow_mut();
            state.ops.push("close".into());
            state.closes += 1;
        }
        Ok(())
    }
}

/// Control plane with a fixed webapp and a script of task answers
pub struct ScriptedApi {
    pub webapp: Webapp,
    pub statuses: RefCell<VecDeque<ApiResult<TaskStatus>>>,
    pub queued: RefCell<Vec<TaskKind>>,
    pub reject_token: bool,
    next_id: Cell<u64>,
}

impl ScriptedApi {
    pub fn new(webapp: Webapp) -> Self {
        Self {
            webapp,
            statuses: RefCell::new(VecDeque::from(vec![Ok(TaskStatus::Completed)])),
            queued: RefCell::new(Vec::new()),
            reject_token: false,
            next_id: Cell::new(100),
        }
    }

    pub fn with_statuses(self, statuses: Vec<ApiResult<TaskStatus>>) -> Self {
        *self.statuses.borrow_mut() = statuses.into();
        self
    }

    pub fn queued(&self) -> Vec<TaskKind> {
        self.queued.borrow().clone()
    }
}

impl ControlPlane for ScriptedApi {
    fn webapp(&self, handle: &str) -> ApiResult<Webapp> {
        if self.reject_token {
            return Err(ApiError::Unauthorized {
                resource: format!("webapp '{}'", handle),
                message: "Invalid token.".into(),
            });
        }
        Ok(self.webapp.clone())
    }

    fn issue_credentials(&self, webapp: &Webapp, _env: Environment) -> ApiResult<Credentials> {
        self.queued.borrow_mut().push(TaskKind::ResetPassword);
        Ok(Credentials::new(webapp.handle.clone(), "generated-password"))
    }

    fn queue_task(&self, _webapp: &Webapp, _env: Environment, kind: TaskKind) -> ApiResult<TaskId> {
        self.queued.borrow_mut().push(kind);
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Ok(TaskId(id))
    }

    fn task_status(&self, _task: TaskId) -> ApiResult<TaskStatus> {
        self.statuses
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(TaskStatus::Running))
    }
}

/// Event sink that keeps everything it is sent
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<DeployEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<DeployEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl DeployEventSink for RecordingSink {
    fn on_event(&self, event: DeployEvent) {
        self.events.lock().unwrap().push(event);
    }
}
