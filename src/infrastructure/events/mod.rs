//! Event Sink Implementations
//!
//! - JsonEventSink: NDJSON output for CI/automation
//!
//! The human-readable console sink lives with the binary's terminal code.

mod json;

pub use json::{event_json, JsonEventSink};
