//! Connection factories.
//!
//! The gateway never opens SQLite itself; it asks a [`ConnectionFactory`] for
//! a configured connection. Tests inject [`MemoryConnection`], the CLI uses
//! [`FileConnection`].

use std::path::PathBuf;

use rusqlite::Connection;

use super::error::Result;

/// Produces a ready-to-use SQLite connection.
pub trait ConnectionFactory: Send + Sync {
    fn connect(&self) -> Result<Connection>;

    /// Human-readable location, for logging.
    fn describe(&self) -> String;
}

/// A file-backed database. Creates parent directories and enables WAL.
#[derive(Debug, Clone)]
pub struct FileConnection {
    path: PathBuf,
}

impl FileConnection {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `echo.db` in the platform data directory.
    pub fn default_location() -> Option<Self> {
        let dirs = directories::ProjectDirs::from("", "", "echo")?;
        Some(Self::new(dirs.data_dir().join("echo.db")))
    }
}

impl ConnectionFactory for FileConnection {
    fn connect(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(conn)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A private in-memory database, gone when the connection drops.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryConnection;

impl ConnectionFactory for MemoryConnection {
    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open_in_memory()?)
    }

    fn describe(&self) -> String {
        ":memory:".to_string()
    }
}
