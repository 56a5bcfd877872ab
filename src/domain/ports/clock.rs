//! Clock Port
//!
//! Time source and sleeper used by retry backoff and task polling, so tests
//! can run without waiting.

use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}
