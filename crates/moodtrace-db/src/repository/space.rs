//! SurrealDB implementation of [`SpaceRepository`].

use chrono::{DateTime, Utc};
use moodtrace_core::error::MoodTraceResult;
use moodtrace_core::models::space::{CreateSpace, Space, UpdateSpace};
use moodtrace_core::repository::{PaginatedResult, Pagination, SpaceRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, first_row, parse_uuid};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct SpaceRow {
    name: String,
    slug: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SpaceRow {
    fn into_space(self, id: Uuid) -> Space {
        Space {
            id,
            name: self.name,
            slug: self.slug,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct SpaceRowWithId {
    record_id: String,
    name: String,
    slug: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SpaceRowWithId {
    fn try_into_space(self) -> Result<Space, DbError> {
        let id = parse_uuid("space", &self.record_id)?;
        Ok(SpaceRow {
            name: self.name,
            slug: self.slug,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_space(id))
    }
}

/// SurrealDB implementation of the Space repository.
#[derive(Clone)]
pub struct SurrealSpaceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSpaceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SpaceRepository for SurrealSpaceRepository<C> {
    async fn create(&self, input: CreateSpace) -> MoodTraceResult<Space> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('space', $id) SET \
                 name = $name, slug = $slug, metadata = $metadata",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SpaceRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, "space", id_str)?.into_space(id))
    }

    async fn get_by_id(&self, id: Uuid) -> MoodTraceResult<Space> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('space', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SpaceRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, "space", id_str)?.into_space(id))
    }

    async fn get_by_slug(&self, slug: &str) -> MoodTraceResult<Space> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM space WHERE slug = $slug",
            )
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SpaceRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, "space", format!("slug={slug}"))?.try_into_space()?)
    }

    async fn update(&self, id: Uuid, input: UpdateSpace) -> MoodTraceResult<Space> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.slug.is_some() {
            sets.push("slug = $slug");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('space', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(slug) = input.slug {
            builder = builder.bind(("slug", slug));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SpaceRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, "space", id_str)?.into_space(id))
    }

    async fn delete(&self, id: Uuid) -> MoodTraceResult<()> {
        let id_str = id.to_string();

        // Memberships and the subscription go with the space.
        self.db
            .query(
                "DELETE membership WHERE space_id = $id; \
                 DELETE subscription WHERE space_id = $id; \
                 DELETE type::record('space', $id);",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> MoodTraceResult<PaginatedResult<Space>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM space GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM space \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SpaceRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(SpaceRowWithId::try_into_space)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
