//! Local lead store seam used by the sync engine.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AccountScope, Lead, LeadId, LeadPatch, SyncMetadata};

/// Persistent per-account lead collection.
///
/// Every failure surfaces as `Error::StoreUnavailable` unless noted. Stores
/// may opt into a uniqueness constraint on the identity key, in which case
/// `insert_lead` reports `Error::DuplicateIdentity` for known keys.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// All stored leads for the account, in insertion order
    async fn list_leads(&self, scope: &AccountScope) -> Result<Vec<Lead>>;

    /// Persist one lead under a freshly assigned id
    async fn insert_lead(&self, scope: &AccountScope, lead: &Lead) -> Result<Lead>;

    /// Modify fields of one stored lead (`Error::NotFound` if absent)
    async fn update_lead_field(
        &self,
        scope: &AccountScope,
        id: &LeadId,
        patch: LeadPatch,
    ) -> Result<Lead>;

    /// Upsert the account's sync bookkeeping
    async fn record_sync_metadata(
        &self,
        scope: &AccountScope,
        metadata: &SyncMetadata,
    ) -> Result<()>;
}
