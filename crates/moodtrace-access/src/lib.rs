//! MoodTrace Access: viewer context resolution, quota enforcement and
//! plan override administration on top of the repository traits.

pub mod config;
pub mod error;
pub mod service;

pub use config::AccessConfig;
pub use error::AccessError;
pub use service::{AccessService, ViewerContext};
