//! Terminal presentation: capability detection, icons, progress output and
//! prompts.

pub mod console;
pub mod review;
pub mod terminal;
pub mod theme;
