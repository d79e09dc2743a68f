//! SurrealDB implementation of [`MembershipRepository`].
//!
//! The single-owner rule is checked before any write and enforced by the
//! unique `owner_slot` index: the owner row stores the space id there,
//! every other row its own id.

use chrono::{DateTime, Utc};
use moodtrace_core::error::{MoodTraceError, MoodTraceResult};
use moodtrace_core::models::membership::{CreateMembership, Membership, MembershipRole};
use moodtrace_core::repository::{MembershipRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use super::{CountRow, first_row, parse_uuid};
use crate::error::DbError;

const SELECT_MEMBERSHIP: &str = "SELECT meta::id(id) AS record_id, * FROM membership";

#[derive(Debug, SurrealValue)]
struct MembershipRowWithId {
    record_id: String,
    space_id: String,
    user_id: String,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MembershipRowWithId {
    fn try_into_membership(self) -> Result<Membership, DbError> {
        let roles = self
            .roles
            .iter()
            .map(|r| r.parse::<MembershipRole>().map_err(DbError::Decode))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Membership {
            id: parse_uuid("membership", &self.record_id)?,
            space_id: parse_uuid("space", &self.space_id)?,
            user_id: parse_uuid("user", &self.user_id)?,
            roles,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn role_tags(roles: &[MembershipRole]) -> Vec<String> {
    roles.iter().map(|r| r.as_str().to_string()).collect()
}

/// Maps a unique index violation to `AlreadyExists`.
fn conflict_error(message: &str) -> MoodTraceError {
    let entity = if message.contains("idx_membership_owner") {
        "space owner"
    } else if message.contains("idx_membership_space_user") {
        "membership"
    } else {
        return DbError::Query(message.to_string()).into();
    };
    MoodTraceError::AlreadyExists {
        entity: entity.into(),
    }
}

fn validation(message: impl Into<String>) -> MoodTraceError {
    MoodTraceError::Validation {
        message: message.into(),
    }
}

/// SurrealDB implementation of the Membership repository.
#[derive(Clone)]
pub struct SurrealMembershipRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMembershipRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find(&self, space_id: Uuid, user_id: Uuid) -> Result<Option<Membership>, DbError> {
        let mut result = self
            .db
            .query(format!(
                "{SELECT_MEMBERSHIP} WHERE space_id = $space_id AND user_id = $user_id"
            ))
            .bind(("space_id", space_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await?;

        let rows: Vec<MembershipRowWithId> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(MembershipRowWithId::try_into_membership)
            .transpose()
    }

    async fn find_owner(&self, space_id: Uuid) -> Result<Option<Membership>, DbError> {
        let mut result = self
            .db
            .query(format!(
                "{SELECT_MEMBERSHIP} WHERE space_id = $space_id AND roles CONTAINS 'owner'"
            ))
            .bind(("space_id", space_id.to_string()))
            .await?;

        let rows: Vec<MembershipRowWithId> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(MembershipRowWithId::try_into_membership)
            .transpose()
    }
}

impl<C: Connection> MembershipRepository for SurrealMembershipRepository<C> {
    async fn create(&self, input: CreateMembership) -> MoodTraceResult<Membership> {
        if input.roles.is_empty() {
            return Err(validation("a membership needs at least one role"));
        }
        if self.find(input.space_id, input.user_id).await?.is_some() {
            return Err(MoodTraceError::AlreadyExists {
                entity: "membership".into(),
            });
        }
        if input.roles.contains(&MembershipRole::Owner)
            && self.find_owner(input.space_id).await?.is_some()
        {
            return Err(MoodTraceError::AlreadyExists {
                entity: "space owner".into(),
            });
        }

        let id_str = Uuid::new_v4().to_string();
        let space_id_str = input.space_id.to_string();
        let owner_slot = if input.roles.contains(&MembershipRole::Owner) {
            space_id_str.clone()
        } else {
            id_str.clone()
        };

        let result = self
            .db
            .query(
                "CREATE type::record('membership', $id) SET \
                 space_id = $space_id, user_id = $user_id, roles = $roles, \
                 owner_slot = $owner_slot; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('membership', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("space_id", space_id_str))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("roles", role_tags(&input.roles)))
            .bind(("owner_slot", owner_slot))
            .await
            .map_err(DbError::from)?;

        // Unique indexes catch creates racing the checks above.
        let mut result = result.check().map_err(|e| conflict_error(&e.to_string()))?;

        // Statement 0 is the CREATE, statement 1 reads it back with its id.
        let rows: Vec<MembershipRowWithId> = result.take(1).map_err(DbError::from)?;
        let membership = first_row(rows, "membership", id_str)?.try_into_membership()?;

        info!(
            space_id = %membership.space_id,
            user_id = %membership.user_id,
            roles = ?membership.roles,
            "Membership created"
        );
        Ok(membership)
    }

    async fn get(&self, space_id: Uuid, user_id: Uuid) -> MoodTraceResult<Membership> {
        self.find(space_id, user_id)
            .await?
            .ok_or_else(|| MoodTraceError::NotFound {
                entity: "membership".into(),
                id: format!("space={space_id},user={user_id}"),
            })
    }

    async fn get_owner(&self, space_id: Uuid) -> MoodTraceResult<Membership> {
        self.find_owner(space_id)
            .await?
            .ok_or_else(|| MoodTraceError::NotFound {
                entity: "space owner".into(),
                id: space_id.to_string(),
            })
    }

    async fn update_roles(
        &self,
        space_id: Uuid,
        user_id: Uuid,
        roles: Vec<MembershipRole>,
    ) -> MoodTraceResult<Membership> {
        if roles.is_empty() {
            return Err(validation("a membership needs at least one role"));
        }

        let existing = self.get(space_id, user_id).await?;
        let grants_owner = roles.contains(&MembershipRole::Owner);
        if existing.is_owner() && !grants_owner {
            return Err(validation("the owner role cannot be removed"));
        }
        if !existing.is_owner() && grants_owner {
            return Err(validation("the owner role cannot be granted"));
        }

        let id_str = existing.id.to_string();
        let result = self
            .db
            .query(
                "UPDATE type::record('membership', $id) SET \
                 roles = $roles, updated_at = time::now(); \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('membership', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("roles", role_tags(&roles)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<MembershipRowWithId> = result.take(1).map_err(DbError::from)?;
        let membership = first_row(rows, "membership", id_str)?.try_into_membership()?;

        info!(%space_id, %user_id, roles = ?membership.roles, "Membership roles changed");
        Ok(membership)
    }

    async fn delete(&self, space_id: Uuid, user_id: Uuid) -> MoodTraceResult<()> {
        let existing = self.get(space_id, user_id).await?;
        if existing.is_owner() {
            return Err(validation("the space owner cannot be removed"));
        }

        self.db
            .query("DELETE type::record('membership', $id)")
            .bind(("id", existing.id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(%space_id, %user_id, "Membership removed");
        Ok(())
    }

    async fn list_by_space(
        &self,
        space_id: Uuid,
        pagination: Pagination,
    ) -> MoodTraceResult<PaginatedResult<Membership>> {
        let space_id_str = space_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM membership \
                 WHERE space_id = $space_id GROUP ALL",
            )
            .bind(("space_id", space_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "{SELECT_MEMBERSHIP} WHERE space_id = $space_id \
                 ORDER BY created_at ASC LIMIT $limit START $offset"
            ))
            .bind(("space_id", space_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(MembershipRowWithId::try_into_membership)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_by_user(&self, user_id: Uuid) -> MoodTraceResult<Vec<Membership>> {
        let mut result = self
            .db
            .query(format!(
                "{SELECT_MEMBERSHIP} WHERE user_id = $user_id ORDER BY created_at ASC"
            ))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(MembershipRowWithId::try_into_membership)
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
