//! Domain Entities
//!
//! Core objects of a deploy run.

mod deploy_plan;
mod file_record;
mod upload_report;
mod webapp;

pub use deploy_plan::{ChangeReason, DeployPlan, PlanAction, PlanEntry};
pub use file_record::{FileRecord, LocalFileRecord, LocalTree, RemoteFileRecord, RemoteListing};
pub use upload_report::{FailedTransfer, UploadReport};
pub use webapp::Webapp;
