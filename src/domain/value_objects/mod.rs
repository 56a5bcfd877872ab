//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod connection;
mod deploy_state;
mod environment;
mod exclude_rules;
mod rel_path;
mod site_type;

pub use connection::{Credentials, RemoteHost};
pub use deploy_state::DeployState;
pub use environment::Environment;
pub use exclude_rules::{
    ExcludeRules, ALWAYS_SKIPPED_DIRS, ALWAYS_SKIPPED_FILES, IGNORE_FILE,
};
pub use rel_path::{PathError, RelPath};
pub use site_type::{Activation, Capabilities, PackageProfile, SiteType};
