//! Role classification and per-entry access checks.
//!
//! Role data may be absent (no membership record); absence is treated
//! as holding no role, never as an error.

use serde::{Deserialize, Serialize};

use crate::models::membership::MembershipRole;

/// Audience a viewer belongs to within a space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    /// The space owner.
    Patient,
    /// Anyone else viewing the space.
    Caregiver,
}

/// Result of classifying a viewer's role set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleClassification {
    pub is_patient: bool,
    pub is_caregiver: bool,
}

impl RoleClassification {
    pub fn audience(&self) -> Audience {
        if self.is_patient {
            Audience::Patient
        } else {
            Audience::Caregiver
        }
    }
}

/// Classify a viewer as patient (holds `owner`) or caregiver.
pub fn classify(roles: Option<&[MembershipRole]>) -> RoleClassification {
    let is_patient = roles.is_some_and(|r| r.contains(&MembershipRole::Owner));
    RoleClassification {
        is_patient,
        is_caregiver: !is_patient,
    }
}

/// Decide whether a viewer may see an entry guarded by `required`.
///
/// `required` is an all-of set: every listed role must be held.
/// Holding `owner` grants everything.
pub fn has_access(
    viewer_roles: Option<&[MembershipRole]>,
    required: Option<&[MembershipRole]>,
) -> bool {
    let Some(required) = required else {
        return true;
    };
    let Some(viewer_roles) = viewer_roles else {
        return false;
    };
    if viewer_roles.contains(&MembershipRole::Owner) {
        return true;
    }
    required.iter().all(|role| viewer_roles.contains(role))
}
