//! Account repository implementation

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::models::{Account, AccountScope, SyncMetadata};
use crate::util::unix_millis_now;
use libsql::{params, Connection};

/// Trait for account record operations (async)
#[allow(async_fn_in_trait)]
pub trait AccountRepository {
    /// Upsert sync bookkeeping, creating the account if needed
    async fn record_sync(&self, scope: &AccountScope, metadata: &SyncMetadata) -> Result<()>;

    /// Create the account record if it does not exist yet
    async fn ensure(&self, scope: &AccountScope, display_name: &str) -> Result<()>;

    /// Get one account
    async fn get(&self, scope: &AccountScope) -> Result<Option<Account>>;

    /// All known accounts, by scope
    async fn list(&self) -> Result<Vec<Account>>;
}

/// libSQL implementation of `AccountRepository`
pub struct LibSqlAccountRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlAccountRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_account(row: &libsql::Row) -> Result<Account> {
        let scope: String = row.get(0)?;
        let scope = AccountScope::from_phone(&scope)
            .map_err(|_| Error::StoreUnavailable(format!("corrupt account scope: {scope}")))?;
        let last_synced_at = row
            .get::<Option<String>>(3)?
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|at| at.with_timezone(&Utc));

        Ok(Account {
            scope,
            display_name: row.get(1)?,
            source: row.get(2)?,
            last_synced_at,
            created_at: row.get(4)?,
        })
    }
}

impl AccountRepository for LibSqlAccountRepository<'_> {
    async fn record_sync(&self, scope: &AccountScope, metadata: &SyncMetadata) -> Result<()> {
        // Merge semantics: an empty display name keeps the stored one
        self.conn
            .execute(
                "INSERT INTO accounts (scope, display_name, source, last_synced_at, created_at)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(scope) DO UPDATE SET
                    display_name = CASE
                        WHEN excluded.display_name = '' THEN accounts.display_name
                        ELSE excluded.display_name
                    END,
                    source = excluded.source,
                    last_synced_at = excluded.last_synced_at",
                params![
                    scope.as_str(),
                    metadata.display_name.trim(),
                    metadata.source.as_str(),
                    metadata.last_synced_at.to_rfc3339(),
                    unix_millis_now()
                ],
            )
            .await?;
        Ok(())
    }

    async fn ensure(&self, scope: &AccountScope, display_name: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO accounts (scope, display_name, created_at) VALUES (?, ?, ?)",
                params![scope.as_str(), display_name.trim(), unix_millis_now()],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, scope: &AccountScope) -> Result<Option<Account>> {
        let mut rows = self
            .conn
            .query(
                "SELECT scope, display_name, source, last_synced_at, created_at
                 FROM accounts WHERE scope = ?",
                [scope.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_account(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Account>> {
        let mut rows = self
            .conn
            .query(
                "SELECT scope, display_name, source, last_synced_at, created_at
                 FROM accounts ORDER BY scope ASC",
                (),
            )
            .await?;

        let mut accounts = Vec::new();
        while let Some(row) = rows.next().await? {
            accounts.push(Self::parse_account(&row)?);
        }
        Ok(accounts)
    }
}
