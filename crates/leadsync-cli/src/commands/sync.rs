use std::path::Path;

use leadsync_core::{Error as CoreError, SheetLeadSource, SyncEngine};

use crate::commands::common::{open_database, ProfileContext};
use crate::error::CliError;

pub const MISSING_SHEET_MESSAGE: &str = "No leads available for your account";

pub async fn run_sync(
    as_json: bool,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let (scope, display_name) = context.account()?;
    let source_config = context
        .profile
        .source_config()
        .map_err(CliError::Config)?
        .ok_or(CliError::SourceNotConfigured)?;

    let db = open_database(db_path, &context.profile).await?;
    let engine = SyncEngine::new(SheetLeadSource::new(source_config)?, db.clone());

    match engine.sync_account(&scope, &display_name).await {
        Ok(report) => {
            if as_json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Synced {}: {} new, {} already stored ({} from source)",
                    scope, report.inserted, report.duplicates, report.remote_total
                );
            }
            Ok(())
        }
        Err(error @ CoreError::SourceUnavailable { .. }) => {
            // Stored leads stay usable when the source is down
            eprintln!("Warning: {}", source_warning(&error));
            let stored = db.count_leads(&scope).await?;
            if stored == 0 {
                println!("No leads stored yet.");
            } else {
                println!("{stored} stored leads available. Run `leadsync list` to view them.");
            }
            Ok(())
        }
        Err(CoreError::PartialSyncFailure { succeeded, failed }) => {
            for failure in &failed {
                eprintln!(
                    "Failed to store lead {}: {}",
                    failure.identity_key, failure.message
                );
            }
            Err(CoreError::PartialSyncFailure { succeeded, failed }.into())
        }
        Err(error) => Err(error.into()),
    }
}

pub fn source_warning(error: &CoreError) -> String {
    if error.is_missing_sheet() {
        MISSING_SHEET_MESSAGE.to_string()
    } else {
        error.to_string()
    }
}
