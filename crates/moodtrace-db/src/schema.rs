//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. Override limits are stored as a
//! flexible object and validated when read.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1, initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Spaces (global scope)
-- =======================================================================
DEFINE TABLE space SCHEMAFULL;
DEFINE FIELD name ON TABLE space TYPE string;
DEFINE FIELD slug ON TABLE space TYPE string;
DEFINE FIELD metadata ON TABLE space TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE space TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE space TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_space_slug ON TABLE space COLUMNS slug UNIQUE;

-- =======================================================================
-- Memberships (space scope)
-- =======================================================================
DEFINE TABLE membership SCHEMAFULL;
DEFINE FIELD space_id ON TABLE membership TYPE string;
DEFINE FIELD user_id ON TABLE membership TYPE string;
DEFINE FIELD roles ON TABLE membership TYPE array DEFAULT [];
DEFINE FIELD roles.* ON TABLE membership TYPE string \
    ASSERT $value IN ['owner', 'admin', 'member'];
DEFINE FIELD created_at ON TABLE membership TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE membership TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_membership_space_user ON TABLE membership \
    COLUMNS space_id, user_id UNIQUE;
DEFINE INDEX idx_membership_user ON TABLE membership \
    COLUMNS user_id;
-- Space id for the owner row, the membership's own id otherwise.
DEFINE FIELD owner_slot ON TABLE membership TYPE string;
DEFINE INDEX idx_membership_owner ON TABLE membership \
    COLUMNS owner_slot UNIQUE;

-- =======================================================================
-- Subscriptions (space scope, one per space)
-- =======================================================================
DEFINE TABLE subscription SCHEMAFULL;
DEFINE FIELD space_id ON TABLE subscription TYPE string;
DEFINE FIELD plan_name ON TABLE subscription TYPE string;
DEFINE FIELD status ON TABLE subscription TYPE string \
    ASSERT $value IN ['active', 'trialing', 'past_due', 'canceled'];
DEFINE FIELD provider_customer_id ON TABLE subscription \
    TYPE option<string>;
DEFINE FIELD provider_subscription_id ON TABLE subscription \
    TYPE option<string>;
DEFINE FIELD current_period_end ON TABLE subscription \
    TYPE option<datetime>;
DEFINE FIELD override_limits ON TABLE subscription TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE subscription TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE subscription TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_subscription_space ON TABLE subscription \
    COLUMNS space_id UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Highest applied migration version, `0` on a fresh database.
async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map(|m| m.version).unwrap_or(0))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    info!(
        version = migration.version,
        name = migration.name,
        "Applying migration"
    );

    db.query(migration.sql).await?.check().map_err(|e| {
        DbError::Migration(format!(
            "v{} '{}' failed: {e}",
            migration.version, migration.name
        ))
    })?;

    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!(
                "recording v{} failed: {e}",
                migration.version
            ))
        })?;

    Ok(())
}

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates the `_migration` tracking table on first run, then applies
/// each migration newer than the recorded version. Returns the number
/// of migrations applied, so a second run returns `0`.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<usize, DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current = current_version(db).await?;
    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(db, migration).await?;
        applied += 1;
    }

    info!(current, applied, "Schema up to date");
    Ok(applied)
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_defines_every_table() {
        for table in ["space", "membership", "subscription"] {
            assert!(
                SCHEMA_V1.contains(&format!("DEFINE TABLE {table} SCHEMAFULL")),
                "missing table {table}"
            );
        }
    }

    #[test]
    fn role_and_status_assertions_match_domain_tags() {
        for role in ["'owner'", "'admin'", "'member'"] {
            assert!(SCHEMA_V1.contains(role));
        }
        for status in ["'active'", "'trialing'", "'past_due'", "'canceled'"] {
            assert!(SCHEMA_V1.contains(status));
        }
    }

    #[test]
    fn array_fields_declare_element_types_separately() {
        // A typed `array<T>` already defines `field.*`, which clashes
        // with the explicit element definition carrying the ASSERT.
        assert!(!SCHEMA_V1.contains("array<"));
        assert!(SCHEMA_V1.contains("DEFINE FIELD roles.* ON TABLE membership"));
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
