use thiserror::Error;

/// Why the favorites database could not be opened or migrated.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another bloom process is holding a write lock
    #[error("Another instance of bloom appears to be running. Please close it and try again.")]
    InstanceLocked,

    #[error("Database migration failed: {0}")]
    Migration(String),

    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

/// SQLITE_BUSY / SQLITE_LOCKED, as rendered in sqlx error messages.
pub(crate) fn is_lock_contention(message: &str) -> bool {
    let message = message.to_lowercase();
    ["database is locked", "database table is locked", "sqlite_busy", "sqlite_locked"]
        .iter()
        .any(|needle| message.contains(needle))
}

impl DatabaseError {
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_contention(&err.to_string()) {
            DatabaseError::InstanceLocked
        } else {
            DatabaseError::Other(err)
        }
    }

    pub(crate) fn from_migration(err: anyhow::Error) -> Self {
        let message = err.to_string();
        if is_lock_contention(&message) {
            DatabaseError::InstanceLocked
        } else {
            DatabaseError::Migration(message)
        }
    }
}
