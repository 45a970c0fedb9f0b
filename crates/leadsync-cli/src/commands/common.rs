use std::env;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use leadsync_core::models::{Account, AccountScope, Lead};
use leadsync_core::services::{follow_up_at, DatabaseService};
use leadsync_core::util::normalize_text_option;
use serde::Serialize;

use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub const DB_PATH_ENV: &str = "LEADSYNC_DB_PATH";

/// Loaded config plus the profile a command runs under
pub struct ProfileContext {
    pub config: CliProfilesConfig,
    pub name: String,
    pub profile: CliProfile,
}

impl ProfileContext {
    pub fn load(explicit: Option<&str>) -> Result<Self, CliError> {
        let config = CliProfilesConfig::load().map_err(CliError::Config)?;
        let name = config.resolve_profile_name(explicit);
        let profile = config.profile(&name).cloned().unwrap_or_default();
        Ok(Self {
            config,
            name,
            profile,
        })
    }

    /// Account scope and display name the profile is signed in as
    pub fn account(&self) -> Result<(AccountScope, String), CliError> {
        let phone = self
            .profile
            .phone_number
            .as_deref()
            .ok_or_else(|| CliError::NotLoggedIn(self.name.clone()))?;
        let scope = AccountScope::from_phone(phone)?;
        let display_name = self.profile.display_name.clone().unwrap_or_default();
        Ok((scope, display_name))
    }
}

#[derive(Debug, Serialize)]
pub struct LeadListItem {
    pub id: String,
    pub name: String,
    pub contact_number: String,
    pub platform: String,
    pub lead_status: String,
    pub created_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccountListItem {
    pub scope: String,
    pub display_name: String,
    pub source: Option<String>,
    pub last_synced_at: Option<String>,
}

pub fn lead_to_list_item(lead: &Lead) -> LeadListItem {
    LeadListItem {
        id: lead.id.as_ref().map(ToString::to_string).unwrap_or_default(),
        name: lead.name.clone(),
        contact_number: lead.contact_number.clone(),
        platform: lead.platform.clone(),
        lead_status: lead.lead_status.clone(),
        created_time: lead.created_time.clone(),
        follow_up_at: follow_up_at(lead).map(|at| at.to_rfc3339()),
    }
}

pub fn account_to_list_item(account: &Account) -> AccountListItem {
    AccountListItem {
        scope: account.scope.to_string(),
        display_name: account.display_name.clone(),
        source: account.source.clone(),
        last_synced_at: account.last_synced_at.map(|at| at.to_rfc3339()),
    }
}

pub fn format_lead_lines(leads: &[Lead]) -> Vec<String> {
    leads
        .iter()
        .map(|lead| {
            let short_id = short_lead_id(lead);
            let name = truncate(display_or_dash(&lead.name), 24);
            let status = display_or_dash(&lead.lead_status);
            let platform = display_or_dash(&lead.platform);
            let created = truncate(display_or_dash(&lead.created_time), 20);
            let line = format!(
                "{short_id:<13}  {created:<20}  {name:<24}  {:<15}  {status:<14}  {platform}",
                lead.contact_number
            );
            match follow_up_at(lead) {
                Some(at) => format!("{line}  follow-up {}", format_timestamp(at)),
                None => line,
            }
        })
        .collect()
}

pub fn format_account_lines(accounts: &[Account]) -> Vec<String> {
    accounts
        .iter()
        .map(|account| {
            let synced = account
                .last_synced_at
                .map_or_else(|| "never synced".to_string(), format_timestamp);
            format!(
                "{:<15}  {:<24}  {synced}",
                account.scope.as_str(),
                display_or_dash(&account.display_name)
            )
        })
        .collect()
}

pub fn short_lead_id(lead: &Lead) -> String {
    lead.id
        .as_ref()
        .map(|id| id.to_string().chars().take(13).collect())
        .unwrap_or_default()
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn display_or_dash(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

pub fn truncate(value: &str, max_chars: usize) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn normalize_lead_identifier(id: &str) -> Result<String, CliError> {
    normalize_text_option(Some(id.to_string())).ok_or(CliError::EmptyLeadId)
}

/// Find a lead by full id or unique id prefix
pub async fn resolve_lead(
    lead_query: &str,
    scope: &AccountScope,
    db: &DatabaseService,
) -> Result<Lead, CliError> {
    let lead_query = normalize_lead_identifier(lead_query)?;
    if let Ok(lead_id) = lead_query.parse() {
        if let Some(lead) = db.get_lead(scope, &lead_id).await? {
            return Ok(lead);
        }
    }

    let needle = lead_query.to_ascii_lowercase();
    let mut matching: Vec<Lead> = db
        .list_leads(scope)
        .await?
        .into_iter()
        .filter(|lead| {
            lead.id
                .as_ref()
                .is_some_and(|id| id.to_string().starts_with(&needle))
        })
        .collect();

    match matching.len() {
        0 => Err(CliError::LeadNotFound(lead_query)),
        1 => Ok(matching.remove(0)),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(short_lead_id)
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousLeadId(format!(
                "ID prefix '{lead_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

/// Parse a follow-up time given on the command line (UTC)
pub fn parse_follow_up_time(raw: &str) -> Result<DateTime<Utc>, CliError> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(9, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CliError::InvalidFollowUp(raw.to_string()))
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os(DB_PATH_ENV).map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("leadsync")
        .join("leadsync.db")
}

pub async fn open_database(path: &Path, profile: &CliProfile) -> Result<DatabaseService, CliError> {
    Ok(DatabaseService::open_path(path.to_path_buf())
        .await?
        .with_identity_constraint(profile.unique_leads))
}
