//! Access service configuration.

use moodtrace_core::palette::{DEFAULT_DEBOUNCE_MS, DEFAULT_SHORTCUT};
use moodtrace_core::plans::DEFAULT_PLAN;
use uuid::Uuid;

/// Configuration for the access service.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Plan applied to spaces without a subscription (default: `gratuit`).
    pub default_plan: String,
    /// Key chord toggling the command palette (default: `mod+k`).
    pub palette_shortcut: String,
    /// Delay before a palette query is sent to search (default: 300 ms).
    pub search_debounce_ms: u64,
    /// Largest value an admin may set in an override (default: 10_000).
    pub max_override_value: i64,
    /// Users allowed to set per-space override limits.
    pub platform_admins: Vec<Uuid>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            default_plan: DEFAULT_PLAN.into(),
            palette_shortcut: DEFAULT_SHORTCUT.into(),
            search_debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_override_value: 10_000,
            platform_admins: Vec::new(),
        }
    }
}
