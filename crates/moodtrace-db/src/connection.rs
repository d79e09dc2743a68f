//! Connecting the server to its SurrealDB instance.

use std::fmt;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::schema::run_migrations;

const ENV_URL: &str = "MOODTRACE_DB_URL";
const ENV_NAMESPACE: &str = "MOODTRACE_DB_NAMESPACE";
const ENV_DATABASE: &str = "MOODTRACE_DB_DATABASE";
const ENV_USERNAME: &str = "MOODTRACE_DB_USERNAME";
const ENV_PASSWORD: &str = "MOODTRACE_DB_PASSWORD";

/// Where the MoodTrace data lives and which root credentials open it.
///
/// `Debug` output masks the password so the config can be logged.
#[derive(Clone)]
pub struct DbConfig {
    /// WebSocket address, without scheme (`127.0.0.1:8000`).
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "moodtrace".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &self.url)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl DbConfig {
    /// Read `MOODTRACE_DB_*` variables; unset ones keep their default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        for (key, slot) in [
            (ENV_URL, &mut config.url),
            (ENV_NAMESPACE, &mut config.namespace),
            (ENV_DATABASE, &mut config.database),
            (ENV_USERNAME, &mut config.username),
            (ENV_PASSWORD, &mut config.password),
        ] {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *slot = value;
            }
        }
        config
    }
}

/// Owns the server's SurrealDB client. Repositories take clones of
/// [`client`](Self::client).
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Sign in as root and select the configured namespace and database.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(config.url.as_str()).await?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await?;

        Ok(Self { db })
    }

    /// [`connect`](Self::connect), then bring the schema up to date.
    /// Returns the manager and the number of migrations applied.
    pub async fn open(config: &DbConfig) -> Result<(Self, usize), DbError> {
        let manager = Self::connect(config).await?;
        let applied = run_migrations(&manager.db).await?;
        info!(applied, "MoodTrace database ready");
        Ok((manager, applied))
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variables_keep_defaults() {
        let config = DbConfig::from_lookup(|_| None);
        assert_eq!(config.url, "127.0.0.1:8000");
        assert_eq!(config.namespace, "moodtrace");
    }

    #[test]
    fn set_variables_override_defaults() {
        let config = DbConfig::from_lookup(|key| match key {
            ENV_URL => Some("db.internal:8000".into()),
            ENV_DATABASE => Some("staging".into()),
            ENV_NAMESPACE => Some("  ".into()),
            _ => None,
        });
        assert_eq!(config.url, "db.internal:8000");
        assert_eq!(config.database, "staging");
        assert_eq!(config.namespace, "moodtrace");
        assert_eq!(config.username, "root");
    }

    #[test]
    fn debug_output_masks_password() {
        let config = DbConfig {
            password: "s3cret".into(),
            ..Default::default()
        };
        let shown = format!("{config:?}");
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains("moodtrace"));
    }
}
