//! Domain Services
//!
//! Stateless logic that operates on domain entities.

pub mod differ;
pub mod retry;

pub use differ::{compare, plan, CompareConfig, PlanConfig, TimestampPolicy};
pub use retry::{retry, retry_with, RetryError, RetryPolicy};
