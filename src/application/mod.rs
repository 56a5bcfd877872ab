//! Application Layer
//!
//! Use cases that orchestrate the business flow.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Coordinates between Infrastructure and Domain
//!
//! ## Components
//!
//! - `SessionManager` - Authenticated transfer sessions with bounded retry
//! - `DifferentialUploader` - Survey, plan and execute uploads
//! - `DeployUseCase` - Package → upload → activate → restart
//! - `packaging` - Project layout checks and tree walk
//! - `restart` - Task polling

pub mod cancel;
pub mod deploy;
pub mod packaging;
pub mod restart;
pub mod session;
pub mod uploader;

pub use cancel::CancelToken;
pub use deploy::{DeployMode, DeployOptions, DeployOutcome, DeploySettings, DeployUseCase};
pub use packaging::{check_layout, package, Package};
pub use restart::{wait_for_task, PollPolicy, RestartStatus, TaskWait};
pub use session::{Session, SessionManager};
pub use uploader::{DifferentialUploader, UploadOptions, PART_SUFFIX};
