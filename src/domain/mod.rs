//! Domain Layer
//!
//! Pure deploy logic without I/O dependencies.
//!
//! ## Structure
//!
//! - `entities/` - File records, deploy plan, upload report, webapp
//! - `value_objects/` - RelPath, SiteType, Environment, DeployState, connection details
//! - `services/` - Differ and bounded retry
//! - `ports/` - Transport, control plane, project source, clock, events
//!
//! All I/O goes through the trait-defined ports.

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
