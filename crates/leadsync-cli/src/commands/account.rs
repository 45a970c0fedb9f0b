use std::path::Path;

use leadsync_core::models::{normalize_phone, AccountScope};

use crate::cli::AccountCommands;
use crate::commands::common::{
    account_to_list_item, format_account_lines, format_timestamp, open_database, AccountListItem,
    ProfileContext,
};
use crate::error::CliError;

pub async fn run_account(
    command: AccountCommands,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let mut context = ProfileContext::load(global_profile)?;

    match command {
        AccountCommands::Login { phone, name } => {
            let phone_number = normalize_phone(&phone)?;
            let scope = AccountScope::from_phone(&phone_number)?;
            let display_name = name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty());

            let db = open_database(db_path, &context.profile).await?;
            db.ensure_account(&scope, display_name.as_deref().unwrap_or_default())
                .await?;

            let profile_name = context.name.clone();
            let profile = context.config.profile_mut_or_default(&profile_name);
            profile.phone_number = Some(phone_number.clone());
            if display_name.is_some() {
                profile.display_name = display_name;
            }
            context.config.active_profile = Some(profile_name.clone());
            context.config.save().map_err(CliError::Config)?;

            println!("Profile '{profile_name}' signed in as {phone_number}");
        }
        AccountCommands::Status => {
            let Ok((scope, display_name)) = context.account() else {
                println!("Profile '{}' is not signed in.", context.name);
                return Ok(());
            };
            let db = open_database(db_path, &context.profile).await?;
            let synced = db
                .get_account(&scope)
                .await?
                .and_then(|account| account.last_synced_at)
                .map_or_else(|| "never".to_string(), format_timestamp);
            let label = if display_name.is_empty() {
                scope.to_string()
            } else {
                format!("{display_name} ({scope})")
            };
            println!(
                "Profile '{}' is signed in as {label}; last sync: {synced}",
                context.name
            );
        }
        AccountCommands::Logout => {
            let profile_name = context.name.clone();
            if let Some(profile) = context.config.profiles.get_mut(&profile_name) {
                profile.phone_number = None;
                profile.display_name = None;
                context.config.save().map_err(CliError::Config)?;
            }
            println!("Signed out profile '{profile_name}'");
        }
    }
    Ok(())
}

pub async fn run_accounts(
    as_json: bool,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let db = open_database(db_path, &context.profile).await?;
    let accounts = db.list_accounts().await?;

    if as_json {
        let json_items = accounts
            .iter()
            .map(account_to_list_item)
            .collect::<Vec<AccountListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if accounts.is_empty() {
        println!("No accounts stored yet.");
    } else {
        for line in format_account_lines(&accounts) {
            println!("{line}");
        }
    }
    Ok(())
}
