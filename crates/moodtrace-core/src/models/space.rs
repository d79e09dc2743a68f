//! Space domain model.
//!
//! A space is the tenant of MoodTrace: one patient's tracking data,
//! shared with the caregivers invited into it. Memberships and the
//! subscription are scoped to a space.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder substituted with a space slug in URL templates.
pub const SPACE_SLUG_PLACEHOLDER: &str = ":spaceSlug";

/// A patient's space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// URL-safe unique identifier used in every app route (e.g., `marie-d`).
    pub slug: String,
    /// Arbitrary key-value metadata.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSpace {
    pub name: String,
    pub slug: String,
    pub metadata: Option<serde_json::Value>,
}

/// Fields that can be updated on an existing space.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateSpace {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Replace every `:spaceSlug` placeholder in `template` with `slug`.
pub fn substitute_slug(template: &str, slug: &str) -> String {
    template.replace(SPACE_SLUG_PLACEHOLDER, slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_every_occurrence() {
        assert_eq!(
            substitute_slug("/app/:spaceSlug/x?back=/app/:spaceSlug", "marie"),
            "/app/marie/x?back=/app/marie"
        );
    }

    #[test]
    fn template_without_placeholder_is_unchanged() {
        assert_eq!(substitute_slug("/login", "marie"), "/login");
    }
}
