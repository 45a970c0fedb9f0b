//! libSQL connection for the local lead store

use crate::error::Result;
use libsql::{Builder, Connection, Database as LibSqlDatabase};
use std::path::Path;

use super::migrations;

/// Pragmas applied to every lead store connection.
///
/// `journal_mode` answers with a row and in-memory databases refuse WAL, so
/// each one is best effort.
const PRAGMAS: [&str; 3] = [
    "PRAGMA journal_mode = WAL;",
    "PRAGMA synchronous = NORMAL;",
    "PRAGMA busy_timeout = 5000;",
];

/// A migrated libSQL lead store and its single connection
pub struct Database {
    // Keeps the database handle alive for the connection's lifetime
    _db: LibSqlDatabase,
    conn: Connection,
}

impl Database {
    /// Open (or create) the lead store file at `path` and migrate it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let location = path.as_ref().to_string_lossy().to_string();
        let database = Self::open_location(&location).await?;
        tracing::debug!("Opened lead store at {}", location);
        Ok(database)
    }

    /// Open a throwaway in-memory store
    pub async fn open_in_memory() -> Result<Self> {
        Self::open_location(":memory:").await
    }

    async fn open_location(location: &str) -> Result<Self> {
        let db = Builder::new_local(location).build().await?;
        let conn = db.connect()?;
        for pragma in PRAGMAS {
            conn.query(pragma, ()).await.ok();
        }
        migrations::run(&conn).await?;
        Ok(Self { _db: db, conn })
    }

    /// Connection shared by the repositories
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}
