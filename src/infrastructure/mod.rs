//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `transport/` - SFTP over `ssh2`
//! - `api` - Control plane client over HTTPS
//! - `scanner` - Local project walker
//! - `events/` - NDJSON event sink
//! - `clock` - Wall clock

pub mod api;
pub mod clock;
pub mod events;
pub mod scanner;
pub mod transport;

// Re-export for convenience
pub use api::HttpControlPlane;
pub use clock::SystemClock;
pub use events::JsonEventSink;
pub use scanner::{hash_file, FsProjectSource};
pub use transport::{SftpConnection, SftpTransport};
