//! Lead repository implementation

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::models::{AccountScope, Lead, LeadId, LeadPatch};
use crate::util::unix_millis_now;
use libsql::{params, Connection};

const LEAD_COLUMNS: &str =
    "id, name, contact_number, comments, platform, lead_status, created_time, extra";

/// Trait for lead storage operations, always within one account scope (async)
#[allow(async_fn_in_trait)]
pub trait LeadRepository {
    /// All leads of the scope, in insertion order
    async fn list(&self, scope: &AccountScope) -> Result<Vec<Lead>>;

    /// Get a lead by ID
    async fn get(&self, scope: &AccountScope, id: &LeadId) -> Result<Option<Lead>>;

    /// Insert a lead under a freshly assigned ID
    async fn insert(&self, scope: &AccountScope, lead: &Lead) -> Result<Lead>;

    /// Insert unless a lead with the same identity key is already stored.
    ///
    /// The check and the insert are one statement. Returns `None` when skipped.
    async fn insert_if_absent(&self, scope: &AccountScope, lead: &Lead) -> Result<Option<Lead>>;

    /// Apply a partial update
    async fn update(&self, scope: &AccountScope, id: &LeadId, patch: LeadPatch) -> Result<Lead>;

    /// Permanently delete a lead
    async fn delete(&self, scope: &AccountScope, id: &LeadId) -> Result<()>;

    /// Number of stored leads
    async fn count(&self, scope: &AccountScope) -> Result<usize>;
}

/// libSQL implementation of `LeadRepository`
pub struct LibSqlLeadRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlLeadRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a lead from a database row
    fn parse_lead(row: &libsql::Row) -> Result<Lead> {
        let id: String = row.get(0)?;
        let id = id
            .parse::<LeadId>()
            .map_err(|_| Error::StoreUnavailable(format!("corrupt lead id: {id}")))?;
        let extra: String = row.get(7)?;
        let extra: BTreeMap<String, serde_json::Value> = serde_json::from_str(&extra)?;

        Ok(Lead {
            id: Some(id),
            name: row.get(1)?,
            contact_number: row.get(2)?,
            comments: row.get(3)?,
            platform: row.get(4)?,
            lead_status: row.get(5)?,
            created_time: row.get(6)?,
            extra,
        })
    }

    fn stored_copy(lead: &Lead) -> Lead {
        Lead {
            id: Some(LeadId::new()),
            ..lead.clone()
        }
    }
}

impl LeadRepository for LibSqlLeadRepository<'_> {
    async fn list(&self, scope: &AccountScope) -> Result<Vec<Lead>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {LEAD_COLUMNS} FROM leads
                     WHERE account_scope = ?
                     ORDER BY inserted_at ASC, rowid ASC"
                ),
                [scope.as_str()],
            )
            .await?;

        let mut leads = Vec::new();
        while let Some(row) = rows.next().await? {
            leads.push(Self::parse_lead(&row)?);
        }
        Ok(leads)
    }

    async fn get(&self, scope: &AccountScope, id: &LeadId) -> Result<Option<Lead>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {LEAD_COLUMNS} FROM leads WHERE account_scope = ? AND id = ?"),
                params![scope.as_str(), id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_lead(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, scope: &AccountScope, lead: &Lead) -> Result<Lead> {
        let stored = Self::stored_copy(lead);
        let id = stored.id.unwrap_or_default();
        let now = unix_millis_now();

        self.conn
            .execute(
                "INSERT INTO leads (
                    id, account_scope, identity_key, name, contact_number, comments,
                    platform, lead_status, created_time, extra, inserted_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    id.as_str(),
                    scope.as_str(),
                    stored.identity_key().as_str(),
                    stored.name.as_str(),
                    stored.contact_number.as_str(),
                    stored.comments.as_str(),
                    stored.platform.as_str(),
                    stored.lead_status.as_str(),
                    stored.created_time.as_str(),
                    serde_json::to_string(&stored.extra)?,
                    now,
                    now
                ],
            )
            .await?;

        Ok(stored)
    }

    async fn insert_if_absent(&self, scope: &AccountScope, lead: &Lead) -> Result<Option<Lead>> {
        let stored = Self::stored_copy(lead);
        let id = stored.id.unwrap_or_default();
        let now = unix_millis_now();

        let inserted = self
            .conn
            .execute(
                "INSERT INTO leads (
                    id, account_scope, identity_key, name, contact_number, comments,
                    platform, lead_status, created_time, extra, inserted_at, updated_at
                )
                SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11
                WHERE NOT EXISTS (
                    SELECT 1 FROM leads WHERE account_scope = ?2 AND identity_key = ?3
                )",
                params![
                    id.as_str(),
                    scope.as_str(),
                    stored.identity_key().as_str(),
                    stored.name.as_str(),
                    stored.contact_number.as_str(),
                    stored.comments.as_str(),
                    stored.platform.as_str(),
                    stored.lead_status.as_str(),
                    stored.created_time.as_str(),
                    serde_json::to_string(&stored.extra)?,
                    now
                ],
            )
            .await?;

        Ok((inserted > 0).then_some(stored))
    }

    async fn update(&self, scope: &AccountScope, id: &LeadId, patch: LeadPatch) -> Result<Lead> {
        let mut lead = self
            .get(scope, id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if patch.is_empty() {
            return Ok(lead);
        }
        patch.apply(&mut lead);

        let rows = self
            .conn
            .execute(
                "UPDATE leads SET
                    identity_key = ?, name = ?, contact_number = ?, comments = ?,
                    platform = ?, lead_status = ?, created_time = ?, extra = ?, updated_at = ?
                 WHERE account_scope = ? AND id = ?",
                params![
                    lead.identity_key().as_str(),
                    lead.name.as_str(),
                    lead.contact_number.as_str(),
                    lead.comments.as_str(),
                    lead.platform.as_str(),
                    lead.lead_status.as_str(),
                    lead.created_time.as_str(),
                    serde_json::to_string(&lead.extra)?,
                    unix_millis_now(),
                    scope.as_str(),
                    id.as_str()
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        Ok(lead)
    }

    async fn delete(&self, scope: &AccountScope, id: &LeadId) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "DELETE FROM leads WHERE account_scope = ? AND id = ?",
                params![scope.as_str(), id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn count(&self, scope: &AccountScope) -> Result<usize> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM leads WHERE account_scope = ?",
                [scope.as_str()],
            )
            .await?;

        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::LeadField;
    use serde_json::json;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn scope(phone: &str) -> AccountScope {
        AccountScope::from_phone(phone).unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_assigns_id_and_get() {
        let db = setup().await;
        let repo = LibSqlLeadRepository::new(db.connection());
        let account = scope("9876543210");

        let mut lead = Lead::new("Asha", "+911234567890", "2024-01-01T10:00:00Z");
        lead.extra.insert("budget".into(), json!(25000));
        let stored = repo.insert(&account, &lead).await.unwrap();

        let id = stored.id.unwrap();
        let fetched = repo.get(&account, &id).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
        assert_eq!(fetched.extra.get("budget"), Some(&json!(25000)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_ignores_incoming_id() {
        let db = setup().await;
        let repo = LibSqlLeadRepository::new(db.connection());
        let account = scope("9876543210");

        let existing = repo
            .insert(&account, &Lead::new("A", "1", "t1"))
            .await
            .unwrap();
        let copy = repo.insert(&account, &existing).await.unwrap();

        assert_ne!(copy.id, existing.id);
        assert_eq!(repo.count(&account).await.unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_is_scoped_and_ordered() {
        let db = setup().await;
        let repo = LibSqlLeadRepository::new(db.connection());
        let a = scope("9876543210");
        let b = scope("9123456780");

        repo.insert(&a, &Lead::new("first", "1", "t1")).await.unwrap();
        repo.insert(&a, &Lead::new("second", "2", "t2")).await.unwrap();
        repo.insert(&b, &Lead::new("other", "3", "t3")).await.unwrap();

        let names: Vec<String> = repo
            .list(&a)
            .await
            .unwrap()
            .into_iter()
            .map(|lead| lead.name)
            .collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(repo.list(&b).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_if_absent_skips_known_identity() {
        let db = setup().await;
        let repo = LibSqlLeadRepository::new(db.connection());
        let a = scope("9876543210");
        let b = scope("9123456780");
        let lead = Lead::new("A", "+911234567890", "2024-01-01T10:00:00Z");

        assert!(repo.insert_if_absent(&a, &lead).await.unwrap().is_some());
        assert!(repo.insert_if_absent(&a, &lead).await.unwrap().is_none());
        // Identity is per account
        assert!(repo.insert_if_absent(&b, &lead).await.unwrap().is_some());
        assert_eq!(repo.count(&a).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_single_field() {
        let db = setup().await;
        let repo = LibSqlLeadRepository::new(db.connection());
        let account = scope("9876543210");

        let stored = repo
            .insert(&account, &Lead::new("A", "1", "t1"))
            .await
            .unwrap();
        let id = stored.id.unwrap();

        let updated = repo
            .update(
                &account,
                &id,
                LeadPatch::field(LeadField::LeadStatus, json!("Meeting Done")),
            )
            .await
            .unwrap();

        assert_eq!(updated.lead_status, "Meeting Done");
        assert_eq!(updated.name, "A");
        let fetched = repo.get(&account, &id).await.unwrap().unwrap();
        assert_eq!(fetched.lead_status, "Meeting Done");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_other_scope_is_not_found() {
        let db = setup().await;
        let repo = LibSqlLeadRepository::new(db.connection());
        let a = scope("9876543210");
        let b = scope("9123456780");

        let stored = repo.insert(&a, &Lead::new("A", "1", "t1")).await.unwrap();
        let result = repo
            .update(
                &b,
                &stored.id.unwrap(),
                LeadPatch::field(LeadField::Name, json!("B")),
            )
            .await;

        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete() {
        let db = setup().await;
        let repo = LibSqlLeadRepository::new(db.connection());
        let account = scope("9876543210");

        let stored = repo
            .insert(&account, &Lead::new("A", "1", "t1"))
            .await
            .unwrap();
        let id = stored.id.unwrap();
        repo.delete(&account, &id).await.unwrap();

        assert!(repo.get(&account, &id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&account, &id).await,
            Err(Error::NotFound(_))
        ));
    }
}
