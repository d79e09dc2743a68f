//! MoodTrace Core: domain models, repository traits and the access
//! rules shared by every crate.
//!
//! The rules engine is pure and synchronous:
//! - [`access`]: patient/caregiver classification and per-link role checks
//! - [`navigation`]: static navigation trees and the role-scoped filter
//! - [`plans`]: subscription plan limits with per-space overrides
//! - [`palette`]: command palette index and its client-side state

pub mod access;
pub mod error;
pub mod models;
pub mod navigation;
pub mod palette;
pub mod plans;
pub mod repository;
