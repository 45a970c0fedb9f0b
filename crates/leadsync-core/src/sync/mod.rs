//! Lead sync engine: pull the remote list, store what is new.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;

use crate::error::{Error, FailedInsert, Result};
use crate::models::{AccountScope, IdentityKey, Lead, SyncMetadata};
use crate::source::LeadSource;
use crate::store::LeadStore;

/// Outcome of one successful sync cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Leads newly written to the store
    pub inserted: usize,
    /// Remote leads skipped because their identity key was already known
    pub duplicates: usize,
    /// Size of the fetched remote batch
    pub remote_total: usize,
    pub synced_at: DateTime<Utc>,
}

/// Reconciles a `LeadSource` into a `LeadStore`, one account at a time.
///
/// Sync is additive: local leads are never modified or deleted, and a lead
/// is new iff its identity key is absent from the store and from earlier
/// leads of the same batch.
pub struct SyncEngine<S, T> {
    source: S,
    store: T,
}

impl<S: LeadSource, T: LeadStore> SyncEngine<S, T> {
    pub const fn new(source: S, store: T) -> Self {
        Self { source, store }
    }

    pub const fn store(&self) -> &T {
        &self.store
    }

    /// Run one sync cycle for `scope`.
    ///
    /// Sync metadata is recorded before the fetch, so a source failure still
    /// leaves an updated `last_synced_at`. Inserts run concurrently and are
    /// not rolled back when some of them fail.
    pub async fn sync_account(
        &self,
        scope: &AccountScope,
        display_name: &str,
    ) -> Result<SyncReport> {
        let metadata = SyncMetadata::sheet_now(display_name);
        self.store.record_sync_metadata(scope, &metadata).await?;

        let remote = match self.source.fetch_leads(scope).await {
            Ok(remote) => remote,
            Err(error) => {
                tracing::warn!("Lead fetch failed for {}: {}", scope, error);
                return Err(error);
            }
        };
        let remote_total = remote.len();

        let local = self.store.list_leads(scope).await?;
        let (fresh, mut duplicates) = select_new_leads(&local, remote);
        tracing::debug!(
            "{} remote leads, {} already stored, {} to insert",
            remote_total,
            duplicates,
            fresh.len()
        );

        let results = join_all(
            fresh
                .iter()
                .map(|lead| self.store.insert_lead(scope, lead)),
        )
        .await;

        let mut inserted = 0;
        let mut failed = Vec::new();
        for (lead, result) in fresh.iter().zip(results) {
            match result {
                Ok(_) => inserted += 1,
                // Lost a race against a concurrent writer holding the constraint
                Err(Error::DuplicateIdentity(_)) => duplicates += 1,
                Err(error) => failed.push(FailedInsert {
                    identity_key: lead.identity_key().to_string(),
                    message: error.to_string(),
                }),
            }
        }

        if !failed.is_empty() {
            tracing::warn!(
                "Sync for {} inserted {} leads, {} failed",
                scope,
                inserted,
                failed.len()
            );
            return Err(Error::PartialSyncFailure {
                succeeded: inserted,
                failed,
            });
        }

        tracing::info!(
            "Synced {}: {} new, {} duplicates of {} remote",
            scope,
            inserted,
            duplicates,
            remote_total
        );
        Ok(SyncReport {
            inserted,
            duplicates,
            remote_total,
            synced_at: metadata.last_synced_at,
        })
    }
}

/// Split a remote batch into leads to insert and a duplicate count.
///
/// The seen set grows while walking the batch, so a key repeated within the
/// batch is inserted once.
fn select_new_leads(local: &[Lead], remote: Vec<Lead>) -> (Vec<Lead>, usize) {
    let mut seen: HashSet<IdentityKey> = local.iter().map(Lead::identity_key).collect();
    let mut duplicates = 0;
    let fresh = remote
        .into_iter()
        .filter(|lead| {
            let is_new = seen.insert(lead.identity_key());
            if !is_new {
                duplicates += 1;
            }
            is_new
        })
        .collect();
    (fresh, duplicates)
}
