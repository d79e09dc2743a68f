//! SurrealDB repository implementations.

mod membership;
mod space;
mod subscription;

pub use membership::SurrealMembershipRepository;
pub use space::SurrealSpaceRepository;
pub use subscription::SurrealSubscriptionRepository;

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Parse a UUID stored as a string column.
fn parse_uuid(column: &str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {column} UUID: {e}")))
}

/// First row of a result set, or `NotFound`.
fn first_row<T>(rows: Vec<T>, entity: &str, id: impl Into<String>) -> Result<T, DbError> {
    rows.into_iter().next().ok_or_else(|| DbError::NotFound {
        entity: entity.into(),
        id: id.into(),
    })
}
