//! Service layer shared by the sync engine and clients

mod database;

pub use database::{
    follow_up_at, DatabaseService, ImportSummary, FOLLOW_UP_AT_FIELD, FOLLOW_UP_NOTE_FIELD,
    NOTES_FIELD,
};
