//! crship - deployment client for managed web-app hosting
//!
//! crship packages a local project directory, opens an authenticated SFTP
//! session to the hosting platform, uploads only the files that changed and
//! then asks the control-plane API to activate and restart the site.
//!
//! ## Layers
//!
//! - `domain` - value objects, entities, pure services and ports
//! - `application` - session manager, differential uploader, deploy orchestrator
//! - `infrastructure` - ssh2 transport, HTTP control plane, filesystem scanner, event sinks
//! - `config` - layered TOML configuration

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

// Re-exports for convenience
pub use application::deploy::{
    DeployMode, DeployOptions, DeployOutcome, DeploySettings, DeployUseCase,
};
pub use application::{CancelToken, DifferentialUploader, Session, SessionManager};
pub use config::Config;
pub use domain::entities::{DeployPlan, FileRecord, LocalTree, RemoteListing, UploadReport};
pub use domain::value_objects::{DeployState, Environment, RelPath, SiteType};
pub use error::{DeployError, DeployResult};
