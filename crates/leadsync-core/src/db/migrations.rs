//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }
    if version < 2 {
        migrate_v2(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    // Check if schema_version table exists
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Run statements one by one inside a transaction, rolling back on failure.
///
/// libsql doesn't have execute_batch.
async fn apply(conn: &Connection, statements: &[&str]) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    Ok(())
}

/// Migration to version 1: accounts and leads
async fn migrate_v1(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            // Schema version tracking
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            // account/<scope>
            "CREATE TABLE IF NOT EXISTS accounts (
                scope TEXT PRIMARY KEY,
                display_name TEXT NOT NULL DEFAULT '',
                source TEXT,
                last_synced_at TEXT,
                created_at INTEGER NOT NULL
            )",
            // account/<scope>/leads/<id>
            "CREATE TABLE IF NOT EXISTS leads (
                id TEXT PRIMARY KEY,
                account_scope TEXT NOT NULL,
                identity_key TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                contact_number TEXT NOT NULL DEFAULT '',
                comments TEXT NOT NULL DEFAULT '',
                platform TEXT NOT NULL DEFAULT '',
                lead_status TEXT NOT NULL DEFAULT '',
                created_time TEXT NOT NULL DEFAULT '',
                extra TEXT NOT NULL DEFAULT '{}',
                inserted_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_leads_scope ON leads(account_scope, inserted_at)",
            // Not unique: the identity key is a heuristic
            "CREATE INDEX IF NOT EXISTS idx_leads_identity ON leads(account_scope, identity_key)",
            "INSERT INTO schema_version (version) VALUES (1)",
        ],
    )
    .await?;

    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: per-account pipeline stages, custom fields, KPI cards
async fn migrate_v2(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            "CREATE TABLE IF NOT EXISTS pipeline_stages (
                id TEXT PRIMARY KEY,
                account_scope TEXT NOT NULL,
                label TEXT NOT NULL COLLATE NOCASE,
                position INTEGER NOT NULL,
                UNIQUE (account_scope, label)
            )",
            "CREATE TABLE IF NOT EXISTS custom_fields (
                id TEXT PRIMARY KEY,
                account_scope TEXT NOT NULL,
                name TEXT NOT NULL COLLATE NOCASE,
                kind TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE (account_scope, name)
            )",
            "CREATE TABLE IF NOT EXISTS custom_kpis (
                id TEXT PRIMARY KEY,
                account_scope TEXT NOT NULL,
                label TEXT NOT NULL,
                color TEXT NOT NULL,
                icon TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_custom_kpis_scope ON custom_kpis(account_scope)",
            "INSERT INTO schema_version (version) VALUES (2)",
        ],
    )
    .await?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsql::Builder;

    async fn setup() -> Connection {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        db.connect().unwrap()
    }

    async fn table_exists(conn: &Connection, name: &str) -> bool {
        let mut rows = conn
            .query(
                "SELECT EXISTS(
                    SELECT 1 FROM sqlite_master
                    WHERE type = 'table' AND name = ?
                )",
                [name],
            )
            .await
            .unwrap();

        rows.next()
            .await
            .unwrap()
            .is_some_and(|row| row.get::<i32>(0).unwrap() != 0)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        let version = get_version(&conn).await.unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations_idempotent() {
        let conn = setup().await;
        run(&conn).await.unwrap();
        run(&conn).await.unwrap(); // Should not fail

        let version = get_version(&conn).await.unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations_create_all_tables() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        for table in [
            "accounts",
            "leads",
            "pipeline_stages",
            "custom_fields",
            "custom_kpis",
        ] {
            assert!(table_exists(&conn, table).await, "missing table {table}");
        }
    }
}
