//! Deploy Module
//!
//! Orchestrates package → upload → activate → restart.
//!
//! ## Structure
//!
//! - `options` - Configuration types (`DeployOptions`, `DeploySettings`)
//! - `state` - State machine (`DeployStateMachine`)
//! - `result` - Result types (`DeployOutcome`)
//! - `use_case` - Core use case logic (`DeployUseCase`)
//!
//! ## Usage
//!
//! ```ignore
//! use crship::application::deploy::{DeployOptions, DeploySettings, DeployUseCase};
//!
//! let use_case = DeployUseCase::new(transport, api, source, settings, clock);
//! let outcome = use_case.execute(&DeployOptions::new("mysite", "."));
//! ```

mod options;
mod result;
mod state;
mod use_case;

pub use options::{DeployMode, DeployOptions, DeploySettings};
pub use result::DeployOutcome;
pub use state::DeployStateMachine;
pub use use_case::DeployUseCase;
