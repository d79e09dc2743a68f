//! Membership domain model.
//!
//! A membership links a user to a space and carries the role tags the
//! user holds there. The owner of a space is its patient; every other
//! member is a caregiver.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Role tag held by a member of a space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    Owner,
    Admin,
    Member,
}

impl MembershipRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Owner => "owner",
            MembershipRole::Admin => "admin",
            MembershipRole::Member => "member",
        }
    }
}

impl fmt::Display for MembershipRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(MembershipRole::Owner),
            "admin" => Ok(MembershipRole::Admin),
            "member" => Ok(MembershipRole::Member),
            other => Err(format!("unknown membership role: {other}")),
        }
    }
}

/// Parse the comma-separated role string used by the auth provider
/// (e.g. `"admin,member"`).
///
/// Unknown tags are dropped and duplicates collapsed, keeping first
/// occurrence order.
pub fn parse_roles(raw: &str) -> Vec<MembershipRole> {
    let mut roles = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match tag.parse::<MembershipRole>() {
            Ok(role) if !roles.contains(&role) => roles.push(role),
            Ok(_) => {}
            Err(reason) => debug!(%reason, "ignoring role tag"),
        }
    }
    roles
}

/// Inverse of [`parse_roles`].
pub fn format_roles(roles: &[MembershipRole]) -> String {
    roles
        .iter()
        .map(MembershipRole::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub id: Uuid,
    pub space_id: Uuid,
    pub user_id: Uuid,
    pub roles: Vec<MembershipRole>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    pub fn is_owner(&self) -> bool {
        self.roles.contains(&MembershipRole::Owner)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    pub space_id: Uuid,
    pub user_id: Uuid,
    pub roles: Vec<MembershipRole>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_roles() {
        assert_eq!(
            parse_roles("admin, member"),
            vec![MembershipRole::Admin, MembershipRole::Member]
        );
    }

    #[test]
    fn unknown_and_duplicate_tags_are_dropped() {
        assert_eq!(
            parse_roles("Owner,superuser,owner,,"),
            vec![MembershipRole::Owner]
        );
        assert!(parse_roles("").is_empty());
    }

    #[test]
    fn format_is_inverse_of_parse() {
        let roles = vec![MembershipRole::Admin, MembershipRole::Member];
        assert_eq!(format_roles(&roles), "admin,member");
        assert_eq!(parse_roles(&format_roles(&roles)), roles);
    }

    #[test]
    fn serde_uses_lowercase_tags() {
        let json = serde_json::to_string(&MembershipRole::Owner).unwrap();
        assert_eq!(json, "\"owner\"");
    }
}
