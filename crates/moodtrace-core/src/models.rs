//! Domain models for MoodTrace.
//!
//! These are the core types shared across all crates.

pub mod membership;
pub mod space;
pub mod subscription;
