use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] leadsync_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Lead ID cannot be empty")]
    EmptyLeadId,
    #[error("Note text cannot be empty")]
    EmptyNote,
    #[error("Lead not found for id/prefix: {0}")]
    LeadNotFound(String),
    #[error("{0}")]
    AmbiguousLeadId(String),
    #[error("Invalid follow-up time '{0}'. Use RFC 3339, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD`.")]
    InvalidFollowUp(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No account for profile '{0}'. Run `leadsync account login --phone <number>` first.")]
    NotLoggedIn(String),
    #[error(
        "Lead source is not configured. Run `leadsync config init --leads-endpoint <url> --sheet-id <id>` or set LEADSYNC_LEADS_ENDPOINT and LEADSYNC_SHEET_ID."
    )]
    SourceNotConfigured,
}
