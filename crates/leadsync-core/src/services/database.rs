//! Shared database service wrapper used by the sync engine and the CLI.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::db::{
    AccountRepository, CustomizationRepository, Database, LeadRepository,
    LibSqlAccountRepository, LibSqlCustomizationRepository, LibSqlLeadRepository,
};
use crate::error::{Error, Result};
use crate::models::{
    is_builtin_status, value_to_text, Account, AccountScope, CustomField, CustomKpi,
    CustomKpiUpdate, FieldKind, IdentityKey, Lead, LeadField, LeadId, LeadPatch, PipelineStage,
    SyncMetadata, BUILTIN_STATUSES, STATUS_NEW_LEAD,
};
use crate::store::LeadStore;
use crate::util::same_label;

/// Extra field holding the next follow-up instant (RFC 3339)
pub const FOLLOW_UP_AT_FIELD: &str = "follow_up_at";
/// Extra field holding the follow-up reminder text
pub const FOLLOW_UP_NOTE_FIELD: &str = "follow_up_note";
/// Extra field holding the timestamped note log
pub const NOTES_FIELD: &str = "notes";

/// Outcome of a bulk import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Thread-safe service for DB and repository operations.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    enforce_identity: bool,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    ///
    /// A file that is not a database is moved aside and a fresh one created.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = match Database::open(&db_path).await {
            Ok(db) => db,
            Err(error) if Self::is_corrupted_db_error(&error) => {
                tracing::warn!(
                    "Local database at {} is unreadable: {}. Starting over.",
                    db_path.display(),
                    error
                );
                Self::quarantine_corrupted_db_file(&db_path)?;
                Database::open(&db_path).await?
            }
            Err(error) => return Err(error),
        };

        Ok(Self::from_database(db))
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self::from_database(db))
    }

    fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            enforce_identity: false,
        }
    }

    /// Reject inserts whose identity key already exists for the account.
    #[must_use]
    pub const fn with_identity_constraint(mut self, enforce: bool) -> Self {
        self.enforce_identity = enforce;
        self
    }

    fn is_corrupted_db_error(error: &Error) -> bool {
        matches!(error, Error::StoreUnavailable(_))
            && error
                .to_string()
                .to_ascii_lowercase()
                .contains("file is not a database")
    }

    fn quarantine_corrupted_db_file(db_path: &Path) -> Result<()> {
        if !db_path.exists() {
            return Ok(());
        }
        let timestamp = Utc::now().timestamp_millis();
        let file_name = db_path
            .file_name()
            .map_or_else(|| "leadsync.db".into(), |name| name.to_string_lossy());
        let backup_path = db_path.with_file_name(format!("{file_name}.corrupt-{timestamp}"));

        std::fs::rename(db_path, &backup_path)?;
        tracing::warn!(
            "Moved corrupted local DB file from {} to {}",
            db_path.display(),
            backup_path.display()
        );
        Ok(())
    }

    // --- Leads ---

    /// List an account's leads in insertion order.
    pub async fn list_leads(&self, scope: &AccountScope) -> Result<Vec<Lead>> {
        let db = self.db.lock().await;
        let repo = LibSqlLeadRepository::new(db.connection());
        repo.list(scope).await
    }

    /// Fetch one lead by id.
    pub async fn get_lead(&self, scope: &AccountScope, id: &LeadId) -> Result<Option<Lead>> {
        let db = self.db.lock().await;
        let repo = LibSqlLeadRepository::new(db.connection());
        repo.get(scope, id).await
    }

    /// Number of stored leads for the account.
    pub async fn count_leads(&self, scope: &AccountScope) -> Result<usize> {
        let db = self.db.lock().await;
        let repo = LibSqlLeadRepository::new(db.connection());
        repo.count(scope).await
    }

    /// Insert one lead, honoring the identity constraint when enabled.
    pub async fn insert_lead(&self, scope: &AccountScope, lead: &Lead) -> Result<Lead> {
        let db = self.db.lock().await;
        let repo = LibSqlLeadRepository::new(db.connection());
        if !self.enforce_identity {
            return repo.insert(scope, lead).await;
        }

        repo.insert_if_absent(scope, lead)
            .await?
            .ok_or_else(|| Error::DuplicateIdentity(lead.identity_key().to_string()))
    }

    /// Add a lead entered by hand.
    ///
    /// Status defaults to "New Lead" and a missing creation time to now.
    pub async fn create_lead(&self, scope: &AccountScope, mut lead: Lead) -> Result<Lead> {
        lead.name = lead.name.trim().to_string();
        lead.contact_number = lead.contact_number.trim().to_string();
        if lead.name.is_empty() && lead.contact_number.is_empty() {
            return Err(Error::InvalidInput(
                "a lead needs at least a name or a contact number".into(),
            ));
        }
        if lead.lead_status.trim().is_empty() {
            lead.lead_status = STATUS_NEW_LEAD.to_string();
        } else {
            lead.lead_status = self.resolve_status(scope, &lead.lead_status).await?;
        }
        if lead.created_time.trim().is_empty() {
            lead.created_time = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        }

        self.insert_lead(scope, &lead).await
    }

    /// Insert leads whose identity key is not stored yet.
    ///
    /// Keys repeated inside `leads` are imported once.
    pub async fn import_leads(&self, scope: &AccountScope, leads: Vec<Lead>) -> Result<ImportSummary> {
        let mut known: HashSet<IdentityKey> = self
            .list_leads(scope)
            .await?
            .iter()
            .map(Lead::identity_key)
            .collect();

        let mut summary = ImportSummary::default();
        for lead in leads {
            if !known.insert(lead.identity_key()) {
                summary.skipped += 1;
                continue;
            }
            match self.insert_lead(scope, &lead).await {
                Ok(_) => summary.imported += 1,
                Err(Error::DuplicateIdentity(_)) => summary.skipped += 1,
                Err(error) => return Err(error),
            }
        }

        tracing::info!(
            "Imported {} leads ({} skipped) for {}",
            summary.imported,
            summary.skipped,
            scope
        );
        Ok(summary)
    }

    /// Update exactly one field of a stored lead.
    pub async fn update_lead_field(
        &self,
        scope: &AccountScope,
        id: &LeadId,
        field: LeadField,
        value: Value,
    ) -> Result<Lead> {
        self.update_lead(scope, id, LeadPatch::field(field, value))
            .await
    }

    /// Apply a patch to a stored lead.
    pub async fn update_lead(
        &self,
        scope: &AccountScope,
        id: &LeadId,
        patch: LeadPatch,
    ) -> Result<Lead> {
        if patch.is_empty() {
            return Err(Error::InvalidInput("nothing to update".into()));
        }
        let db = self.db.lock().await;
        let repo = LibSqlLeadRepository::new(db.connection());
        repo.update(scope, id, patch).await
    }

    /// Move a lead to another pipeline stage.
    ///
    /// Accepts built-in stages and the account's custom stages, matched
    /// case-insensitively and stored with their canonical label.
    pub async fn update_lead_status(
        &self,
        scope: &AccountScope,
        id: &LeadId,
        status: &str,
    ) -> Result<Lead> {
        let status = self.resolve_status(scope, status).await?;
        self.update_lead_field(scope, id, LeadField::LeadStatus, Value::String(status))
            .await
    }

    /// Set or replace the lead's follow-up reminder.
    pub async fn schedule_follow_up(
        &self,
        scope: &AccountScope,
        id: &LeadId,
        at: DateTime<Utc>,
        note: Option<&str>,
    ) -> Result<Lead> {
        let mut patch = LeadPatch::default();
        patch.extra.insert(
            FOLLOW_UP_AT_FIELD.to_string(),
            Value::String(at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        let note = note.map(str::trim).filter(|note| !note.is_empty());
        patch.extra.insert(
            FOLLOW_UP_NOTE_FIELD.to_string(),
            note.map_or(Value::Null, |note| Value::String(note.to_string())),
        );
        self.update_lead(scope, id, patch).await
    }

    /// Drop the lead's follow-up reminder.
    pub async fn clear_follow_up(&self, scope: &AccountScope, id: &LeadId) -> Result<Lead> {
        let mut patch = LeadPatch::default();
        patch.extra.insert(FOLLOW_UP_AT_FIELD.to_string(), Value::Null);
        patch.extra.insert(FOLLOW_UP_NOTE_FIELD.to_string(), Value::Null);
        self.update_lead(scope, id, patch).await
    }

    /// Append a timestamped line to the lead's notes.
    pub async fn annotate_lead(
        &self,
        scope: &AccountScope,
        id: &LeadId,
        note: &str,
        at: DateTime<Utc>,
    ) -> Result<Lead> {
        let note = note.trim();
        if note.is_empty() {
            return Err(Error::InvalidInput("note cannot be empty".into()));
        }
        let lead = self
            .get_lead(scope, id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let line = format!("[{}] {}", at.format("%Y-%m-%d %H:%M"), note);
        let notes = match lead.extra_text(NOTES_FIELD) {
            Some(existing) if !existing.trim().is_empty() => format!("{existing}\n{line}"),
            _ => line,
        };
        self.update_lead_field(
            scope,
            id,
            LeadField::Custom(NOTES_FIELD.to_string()),
            Value::String(notes),
        )
        .await
    }

    /// Set a field by name from raw text.
    ///
    /// Built-in fields take the text as is; custom fields must be defined for
    /// the account and are coerced to their declared kind.
    pub async fn set_field(
        &self,
        scope: &AccountScope,
        id: &LeadId,
        name: &str,
        raw: &str,
    ) -> Result<Lead> {
        match name.parse::<LeadField>()? {
            LeadField::LeadStatus => self.update_lead_status(scope, id, raw).await,
            LeadField::Custom(key) => {
                let field = self
                    .list_fields(scope)
                    .await?
                    .into_iter()
                    .find(|field| same_label(&field.name, &key))
                    .ok_or_else(|| {
                        Error::InvalidInput(format!("unknown custom field: {key}"))
                    })?;
                let value = field.kind.coerce(raw)?;
                self.update_lead_field(scope, id, LeadField::Custom(field.name), value)
                    .await
            }
            builtin => {
                self.update_lead_field(scope, id, builtin, Value::String(raw.trim().to_string()))
                    .await
            }
        }
    }

    /// Delete a lead.
    pub async fn delete_lead(&self, scope: &AccountScope, id: &LeadId) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlLeadRepository::new(db.connection());
        repo.delete(scope, id).await
    }

    // --- Accounts ---

    /// Make sure an account record exists.
    pub async fn ensure_account(&self, scope: &AccountScope, display_name: &str) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlAccountRepository::new(db.connection());
        repo.ensure(scope, display_name).await
    }

    /// Fetch one account record.
    pub async fn get_account(&self, scope: &AccountScope) -> Result<Option<Account>> {
        let db = self.db.lock().await;
        let repo = LibSqlAccountRepository::new(db.connection());
        repo.get(scope).await
    }

    /// List every account known to this store.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let db = self.db.lock().await;
        let repo = LibSqlAccountRepository::new(db.connection());
        repo.list().await
    }

    // --- Customization ---

    /// Built-in stages followed by the account's custom stages.
    pub async fn status_options(&self, scope: &AccountScope) -> Result<Vec<String>> {
        let mut options: Vec<String> = BUILTIN_STATUSES.iter().map(ToString::to_string).collect();
        options.extend(
            self.list_stages(scope)
                .await?
                .into_iter()
                .map(|stage| stage.label),
        );
        Ok(options)
    }

    async fn resolve_status(&self, scope: &AccountScope, status: &str) -> Result<String> {
        let status = status.trim();
        if status.is_empty() {
            return Err(Error::InvalidInput("status cannot be empty".into()));
        }
        if is_builtin_status(status) {
            return Ok(BUILTIN_STATUSES
                .iter()
                .find(|builtin| same_label(builtin, status))
                .map_or_else(|| status.to_string(), ToString::to_string));
        }
        self.list_stages(scope)
            .await?
            .into_iter()
            .find(|stage| same_label(&stage.label, status))
            .map(|stage| stage.label)
            .ok_or_else(|| Error::InvalidInput(format!("unknown pipeline stage: {status}")))
    }

    pub async fn list_stages(&self, scope: &AccountScope) -> Result<Vec<PipelineStage>> {
        let db = self.db.lock().await;
        let repo = LibSqlCustomizationRepository::new(db.connection());
        repo.list_stages(scope).await
    }

    pub async fn add_stage(&self, scope: &AccountScope, label: &str) -> Result<PipelineStage> {
        let db = self.db.lock().await;
        let repo = LibSqlCustomizationRepository::new(db.connection());
        repo.add_stage(scope, label).await
    }

    pub async fn remove_stage(&self, scope: &AccountScope, label: &str) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlCustomizationRepository::new(db.connection());
        repo.remove_stage(scope, label).await
    }

    pub async fn list_fields(&self, scope: &AccountScope) -> Result<Vec<CustomField>> {
        let db = self.db.lock().await;
        let repo = LibSqlCustomizationRepository::new(db.connection());
        repo.list_fields(scope).await
    }

    /// Define a custom field; built-in field names are reserved.
    pub async fn add_field(
        &self,
        scope: &AccountScope,
        name: &str,
        kind: FieldKind,
    ) -> Result<CustomField> {
        if !matches!(name.parse::<LeadField>()?, LeadField::Custom(_)) {
            return Err(Error::InvalidInput(format!(
                "{} is a built-in field",
                name.trim()
            )));
        }
        let db = self.db.lock().await;
        let repo = LibSqlCustomizationRepository::new(db.connection());
        repo.add_field(scope, name, kind).await
    }

    pub async fn remove_field(&self, scope: &AccountScope, name: &str) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlCustomizationRepository::new(db.connection());
        repo.remove_field(scope, name).await
    }

    pub async fn list_kpis(&self, scope: &AccountScope) -> Result<Vec<CustomKpi>> {
        let db = self.db.lock().await;
        let repo = LibSqlCustomizationRepository::new(db.connection());
        repo.list_kpis(scope).await
    }

    pub async fn add_kpi(
        &self,
        scope: &AccountScope,
        label: &str,
        color: &str,
        icon: &str,
    ) -> Result<CustomKpi> {
        let db = self.db.lock().await;
        let repo = LibSqlCustomizationRepository::new(db.connection());
        repo.add_kpi(scope, label, color, icon).await
    }

    pub async fn update_kpi(
        &self,
        scope: &AccountScope,
        id: &str,
        update: CustomKpiUpdate,
    ) -> Result<CustomKpi> {
        let db = self.db.lock().await;
        let repo = LibSqlCustomizationRepository::new(db.connection());
        repo.update_kpi(scope, id, update).await
    }

    pub async fn remove_kpi(&self, scope: &AccountScope, id: &str) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlCustomizationRepository::new(db.connection());
        repo.remove_kpi(scope, id).await
    }
}

#[async_trait]
impl LeadStore for DatabaseService {
    async fn list_leads(&self, scope: &AccountScope) -> Result<Vec<Lead>> {
        Self::list_leads(self, scope).await
    }

    async fn insert_lead(&self, scope: &AccountScope, lead: &Lead) -> Result<Lead> {
        Self::insert_lead(self, scope, lead).await
    }

    async fn update_lead_field(
        &self,
        scope: &AccountScope,
        id: &LeadId,
        patch: LeadPatch,
    ) -> Result<Lead> {
        self.update_lead(scope, id, patch).await
    }

    async fn record_sync_metadata(
        &self,
        scope: &AccountScope,
        metadata: &SyncMetadata,
    ) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlAccountRepository::new(db.connection());
        repo.record_sync(scope, metadata).await
    }
}

/// Follow-up instant stored on a lead, if any
pub fn follow_up_at(lead: &Lead) -> Option<DateTime<Utc>> {
    lead.extra
        .get(FOLLOW_UP_AT_FIELD)
        .map(value_to_text)
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|at| at.with_timezone(&Utc))
}
