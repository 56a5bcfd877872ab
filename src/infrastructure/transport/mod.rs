//! Transfer protocol adapters

mod sftp;

pub use sftp::{SftpConnection, SftpTransport};
