//! leadsync-core - Core library for leadsync
//!
//! Models, the libSQL lead store, the HTTP lead source, the sync engine that
//! reconciles the two, and the query/analytics/CSV helpers the CLI renders.

pub mod analytics;
pub mod config;
pub mod csv;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod services;
pub mod source;
pub mod store;
pub mod sync;
pub mod util;

pub use config::SourceConfig;
pub use error::{Error, Result};
pub use models::{AccountScope, IdentityKey, Lead, LeadField, LeadId, LeadPatch};
pub use services::DatabaseService;
pub use source::{LeadSource, SheetLeadSource};
pub use store::LeadStore;
pub use sync::{SyncEngine, SyncReport};
