//! Common test utilities for crship integration tests.
//!
//! This module provides:
//! - `fakes`: in-memory transport, scripted control plane, manual clock,
//!   recording event sink
//! - `fixtures`: temp project trees and webapp descriptions

#![allow(dead_code)]

pub mod fakes;
pub mod fixtures;

pub use fakes::*;
pub use fixtures::*;
