use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the persistence gateway.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("{entity} already exists: {id}")]
    Duplicate { entity: &'static str, id: Uuid },

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Migration failed: {0:#}")]
    Migration(anyhow::Error),

    #[error("Database I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl DbError {
    /// Translate a primary-key violation on insert into [`DbError::Duplicate`].
    pub(crate) fn on_insert(err: rusqlite::Error, entity: &'static str, id: Uuid) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Self::Duplicate { entity, id }
            }
            _ => Self::Sqlite(err),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T, E = DbError> = std::result::Result<T, E>;
