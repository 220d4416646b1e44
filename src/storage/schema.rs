use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use super::types::DatabaseError;

const MEMORY_PATH: &str = ":memory:";
const BUSY_TIMEOUT_MS: &str = "5000";

/// Local SQLite database holding the favorites list and the catalog snapshot.
#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

/// Create the database file user-only before SQLite touches it, or tighten
/// an existing file to 0600.
#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    if path.exists() {
        if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to set database file permissions");
        }
        return;
    }

    // A failure here resurfaces from SQLite when it opens the file.
    let _ = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path);
}

impl Database {
    /// Open (creating if needed) the database at `path` and migrate it.
    ///
    /// Pass `":memory:"` for a throwaway in-process database.
    ///
    /// # Errors
    ///
    /// `DatabaseError::InstanceLocked` when another bloom process holds the
    /// write lock past the busy timeout; `DatabaseError::Other` when the file
    /// cannot be opened at all.
    pub async fn open(path: &str) -> Result<Self, DatabaseError> {
        #[cfg(unix)]
        if path != MEMORY_PATH {
            restrict_permissions(Path::new(path));
        }

        // A concurrent `bloom toggle` waits for the writer instead of failing
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{path}?mode=rwc"))
            .map_err(DatabaseError::from_sqlx)?
            .pragma("busy_timeout", BUSY_TIMEOUT_MS);

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        let db = Self { pool };
        db.migrate().await.map_err(DatabaseError::from_migration)?;
        tracing::debug!(path, "Opened database");
        Ok(db)
    }

    /// Create the key-value table. Safe to run on every open.
    async fn migrate(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Keys in use: "favorites", "catalog.snapshot"
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS key_value (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
