//! Data models for leadsync

mod account;
pub mod comments;
mod custom;
mod lead;

pub use account::{normalize_phone, Account, AccountScope, SyncMetadata, SOURCE_SHEET};
pub use custom::{CustomField, CustomKpi, CustomKpiUpdate, FieldKind, PipelineStage};
pub use lead::{
    is_builtin_status, value_to_text, IdentityKey, Lead, LeadField, LeadId, LeadPatch,
    BUILTIN_STATUSES, STATUS_DEAL_DONE, STATUS_MEETING_DONE, STATUS_NEW_LEAD,
};
