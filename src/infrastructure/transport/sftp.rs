//! SFTP transport over `ssh2`
//!
//! Password authentication with a keyboard-interactive fallback. libssh2
//! errors are sorted into the transport error kinds the uploader reacts to:
//! session-level failures mean the connection is gone, SFTP status codes are
//! per-path problems.

use std::fs::File;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ssh2::{ErrorCode, FileStat, OpenFlags, OpenType, RenameFlags, Session, Sftp};
use tracing::{debug, trace};

use crate::domain::ports::{
    EntryKind, RemoteConnection, RemoteEntry, RemoteStat, Transport, TransportError,
    TransportResult,
};
use crate::domain::value_objects::{Credentials, RemoteHost};

// SFTP status codes (draft-ietf-secsh-filexfer)
const FX_NO_SUCH_FILE: i32 = 2;
const FX_NO_CONNECTION: i32 = 6;
const FX_CONNECTION_LOST: i32 = 7;

// libssh2 session error codes
const ERROR_AUTHENTICATION_FAILED: i32 = -18;
const ERROR_PUBLICKEY_UNVERIFIED: i32 = -19;

/// Mode for directories created during upload
const DIR_MODE: i32 = 0o770;
const FILE_MODE: i32 = 0o644;

const COPY_BUFFER: usize = 64 * 1024;

/// Polled between chunks of a transfer; true stops it
pub type InterruptCheck = Arc<dyn Fn() -> bool + Send + Sync>;

/// Opens SFTP connections
#[derive(Clone)]
pub struct SftpTransport {
    connect_timeout: Duration,
    io_timeout: Duration,
    interrupt: Option<InterruptCheck>,
}

impl SftpTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            io_timeout: Duration::from_secs(60),
            interrupt: None,
        }
    }

    /// Timeout for any single blocking SSH operation
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Stop an in-flight upload as soon as `check` returns true
    pub fn with_interrupt(mut self, check: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.interrupt = Some(Arc::new(check));
        self
    }

    pub fn io_timeout(&self) -> Duration {
        self.io_timeout
    }
}

impl Transport for SftpTransport {
    type Connection = SftpConnection;

    fn connect(&self, host: &RemoteHost) -> TransportResult<SftpConnection> {
        let addrs = (host.host.as_str(), host.port)
            .to_socket_addrs()
            .map_err(|e| TransportError::Connect(format!("cannot resolve {}: {}", host, e)))?;

        let mut last_error = None;
        let mut tcp = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    tcp = Some(stream);
                    break;
                }
                Err(e) => last_error = Some(e),
            }
        }
        let tcp = tcp.ok_or_else(|| {
            TransportError::Connect(match last_error {
                Some(e) => format!("TCP connection to {} failed: {}", host, e),
                None => format!("{} resolved to no addresses", host),
            })
        })?;

        let mut session = Session::new()
            .map_err(|e| TransportError::Connect(format!("cannot create SSH session: {}", e)))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(self.io_timeout.as_millis().min(u32::MAX as u128) as u32);

        debug!(host = %host, "TCP connected");
        Ok(SftpConnection {
            host: host.to_string(),
            session: Some(session),
            sftp: None,
            interrupt: self.interrupt.clone(),
        })
    }
}

pub struct SftpConnection {
    host: String,
    session: Option<Session>,
    sftp: Option<Sftp>,
    interrupt: Option<InterruptCheck>,
}

struct PasswordPrompt<'a> {
    password: &'a str,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt<'_> {
    fn prompt(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.to_string()).collect()
    }
}

/// Error on an established session or an SFTP operation on `path`.
fn classify(err: ssh2::Error, path: &str) -> TransportError {
    match err.code() {
        ErrorCode::SFTP(FX_NO_SUCH_FILE) => TransportError::NotFound(path.to_string()),
        ErrorCode::SFTP(FX_NO_CONNECTION) | ErrorCode::SFTP(FX_CONNECTION_LOST) => {
            TransportError::ConnectionLost(err.message().to_string())
        }
        ErrorCode::SFTP(_) => TransportError::File {
            path: path.to_string(),
            message: err.message().to_string(),
        },
        ErrorCode::Session(_) => TransportError::ConnectionLost(err.message().to_string()),
    }
}

/// IO error while streaming file contents
fn classify_io(err: io::Error, path: &str) -> TransportError {
    match err.kind() {
        io::ErrorKind::BrokenPipe
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::UnexpectedEof => TransportError::ConnectionLost(err.to_string()),
        _ => TransportError::File {
            path: path.to_string(),
            message: err.to_string(),
        },
    }
}

/// Stream `source` into `target`, checking `interrupted` before each chunk.
fn copy_chunks(
    source: &mut impl Read,
    target: &mut impl Write,
    local: &Path,
    remote: &str,
    interrupted: &dyn Fn() -> bool,
) -> TransportResult<u64> {
    let mut buf = vec![0u8; COPY_BUFFER];
    let mut written: u64 = 0;
    loop {
        if interrupted() {
            debug!(remote, written, "upload interrupted");
            return Err(TransportError::Interrupted);
        }
        let n = source.read(&mut buf).map_err(|e| TransportError::File {
            path: local.display().to_string(),
            message: e.to_string(),
        })?;
        if n == 0 {
            return Ok(written);
        }
        target
            .write_all(&buf[..n])
            .map_err(|e| classify_io(e, remote))?;
        written += n as u64;
    }
}

fn to_stat(stat: &FileStat) -> RemoteStat {
    let kind = if stat.is_dir() {
        EntryKind::Dir
    } else if stat.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    };
    RemoteStat {
        kind,
        size: stat.size.unwrap_or(0),
        mtime: stat.mtime.map(|m| m as i64),
    }
}

/// Single-quote a path for a POSIX shell
fn quote_path(path: &str) -> String {
    format!("'{}'", path.replace('\'', "'\\''"))
}

impl SftpConnection {
    fn session(&self) -> TransportResult<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| TransportError::ConnectionLost("connection closed".to_string()))
    }

    fn sftp(&self) -> TransportResult<&Sftp> {
        self.sftp
            .as_ref()
            .ok_or_else(|| TransportError::ConnectionLost("SFTP channel not open".to_string()))
    }
}

impl RemoteConnection for SftpConnection {
    fn handshake(&mut self) -> TransportResult<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| TransportError::Connect("connection closed".to_string()))?;
        session
            .handshake()
            .map_err(|e| TransportError::Connect(format!("SSH handshake failed: {}", e)))
    }

    fn authenticate(&mut self, credentials: &Credentials) -> TransportResult<()> {
        let session = self.session()?;
        let user = credentials.username.as_str();

        let password_result = session.userauth_password(user, &credentials.password);
        if password_result.is_err() || !session.authenticated() {
            if let Err(e) = &password_result {
                if let ErrorCode::Session(code) = e.code() {
                    if code != ERROR_AUTHENTICATION_FAILED && code != ERROR_PUBLICKEY_UNVERIFIED {
                        return Err(TransportError::ConnectionLost(e.message().to_string()));
                    }
                }
            }
            trace!(user, "password auth refused, trying keyboard-interactive");
            let mut prompt = PasswordPrompt {
                password: &credentials.password,
            };
            let kbd = session.userauth_keyboard_interactive(user, &mut prompt);
            if kbd.is_err() || !session.authenticated() {
                return Err(TransportError::Auth(format!(
                    "server rejected the password for '{}'",
                    user
                )));
            }
        }

        let sftp = session
            .sftp()
            .map_err(|e| TransportError::Connect(format!("cannot open SFTP channel: {}", e)))?;
        self.sftp = Some(sftp);
        debug!(host = %self.host, user, "authenticated");
        Ok(())
    }

    fn read_dir(&mut self, path: &str) -> TransportResult<Vec<RemoteEntry>> {
        let entries = self
            .sftp()?
            .readdir(Path::new(path))
            .map_err(|e| classify(e, path))?;
        Ok(entries
            .into_iter()
            .filter_map(|(entry_path, stat)| {
                let name = entry_path.file_name()?.to_str()?.to_string();
                Some(RemoteEntry {
                    name,
                    stat: to_stat(&stat),
                })
            })
            .collect())
    }

    fn stat(&mut self, path: &str) -> TransportResult<RemoteStat> {
        let stat = self
            .sftp()?
            .stat(Path::new(path))
            .map_err(|e| classify(e, path))?;
        Ok(to_stat(&stat))
    }

    fn mkdir(&mut self, path: &str) -> TransportResult<()> {
        self.sftp()?
            .mkdir(Path::new(path), DIR_MODE)
            .map_err(|e| classify(e, path))
    }

    fn put(&mut self, local: &Path, remote: &str) -> TransportResult<u64> {
        let mut source = File::open(local).map_err(|e| TransportError::File {
            path: local.display().to_string(),
            message: e.to_string(),
        })?;

        let mut target = self
            .sftp()?
            .open_mode(
                Path::new(remote),
                OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE,
                FILE_MODE,
                OpenType::File,
            )
            .map_err(|e| classify(e, remote))?;

        let interrupted = || self.interrupt.as_ref().is_some_and(|check| check());
        let written = copy_chunks(&mut source, &mut target, local, remote, &interrupted)?;
        target.flush().map_err(|e| classify_io(e, remote))?;
        trace!(remote, written, "file written");
        Ok(written)
    }

    fn set_mtime(&mut self, path: &str, mtime: i64) -> TransportResult<()> {
        let secs = mtime.max(0) as u64;
        let stat = FileStat {
            size: None,
            uid: None,
            gid: None,
            perm: None,
            atime: Some(secs),
            mtime: Some(secs),
        };
        self.sftp()?
            .setstat(Path::new(path), stat)
            .map_err(|e| classify(e, path))
    }

    fn rename(&mut self, from: &str, to: &str) -> TransportResult<()> {
        let sftp = self.sftp()?;
        let flags = RenameFlags::OVERWRITE | RenameFlags::ATOMIC | RenameFlags::NATIVE;
        match sftp.rename(Path::new(from), Path::new(to), Some(flags)) {
            Ok(()) => Ok(()),
            Err(e) => {
                // SFTPv3 servers refuse to replace an existing file
                if matches!(e.code(), ErrorCode::Session(_)) {
                    return Err(classify(e, to));
                }
                debug!(from, to, error = %e, "rename failed, replacing target");
                match sftp.unlink(Path::new(to)) {
                    Ok(()) => {}
                    Err(unlink) if matches!(unlink.code(), ErrorCode::SFTP(FX_NO_SUCH_FILE)) => {}
                    Err(unlink) => return Err(classify(unlink, to)),
                }
                sftp.rename(Path::new(from), Path::new(to), None)
                    .map_err(|e| classify(e, to))
            }
        }
    }

    fn remove(&mut self, path: &str) -> TransportResult<()> {
        self.sftp()?
            .unlink(Path::new(path))
            .map_err(|e| classify(e, path))
    }

    fn checksum(&mut self, path: &str) -> TransportResult<Option<String>> {
        let session = self.session()?;
        let mut channel = session
            .channel_session()
            .map_err(|e| classify(e, path))?;
        let p = quote_path(path);
        channel
            .exec(&format!(
                "sha256sum {} 2>/dev/null || shasum -a 256 {} 2>/dev/null",
                p, p
            ))
            .map_err(|e| classify(e, path))?;

        let mut out = String::new();
        channel
            .read_to_string(&mut out)
            .map_err(|e| classify_io(e, path))?;
        let _ = channel.wait_close();
        if channel.exit_status().unwrap_or(1) != 0 {
            return Ok(None);
        }

        let hash_hex = out.split_whitespace().next().unwrap_or("");
        if hash_hex.len() == 64 && hash_hex.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Some(format!("sha256:{}", hash_hex.to_ascii_lowercase())))
        } else {
            Ok(None)
        }
    }

    fn close(&mut self) -> TransportResult<()> {
        self.sftp.take();
        if let Some(session) = self.session.take() {
            if let Err(e) = session.disconnect(None, "crship done", None) {
                debug!(host = %self.host, error = %e, "disconnect failed");
            }
        }
        Ok(())
    }
}

impl Drop for SftpConnection {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
