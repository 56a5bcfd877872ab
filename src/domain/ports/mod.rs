//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod clock;
pub mod control_plane;
pub mod deploy_events;
pub mod layout_reviewer;
pub mod project_source;
pub mod transport;

pub use clock::Clock;
pub use control_plane::{ApiError, ApiResult, ControlPlane, TaskId, TaskKind, TaskStatus};
pub use deploy_events::{DeployEvent, DeployEventSink, NoopEventSink};
pub use layout_reviewer::{AcceptingReviewer, LayoutIssue, LayoutReviewer};
pub use project_source::{ProjectSource, ScanOptions};
pub use transport::{
    EntryKind, RemoteConnection, RemoteEntry, RemoteStat, Transport, TransportError,
    TransportResult,
};
