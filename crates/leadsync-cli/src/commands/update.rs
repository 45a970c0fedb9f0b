use std::path::Path;

use chrono::Utc;

use crate::commands::common::{
    open_database, parse_follow_up_time, resolve_lead, short_lead_id, ProfileContext,
};
use crate::error::CliError;

pub async fn run_status(
    id: &str,
    status: &str,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let (scope, _) = context.account()?;
    let db = open_database(db_path, &context.profile).await?;
    let lead = resolve_lead(id, &scope, &db).await?;
    let Some(lead_id) = lead.id else {
        return Err(CliError::LeadNotFound(id.to_string()));
    };

    let updated = db.update_lead_status(&scope, &lead_id, status).await?;
    println!("{} -> {}", short_lead_id(&updated), updated.lead_status);
    Ok(())
}

pub async fn run_follow_up(
    id: &str,
    at: Option<&str>,
    note: Option<&str>,
    clear: bool,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let (scope, _) = context.account()?;
    let db = open_database(db_path, &context.profile).await?;
    let lead = resolve_lead(id, &scope, &db).await?;
    let Some(lead_id) = lead.id else {
        return Err(CliError::LeadNotFound(id.to_string()));
    };

    if clear {
        let updated = db.clear_follow_up(&scope, &lead_id).await?;
        println!("Cleared follow-up for {}", short_lead_id(&updated));
        return Ok(());
    }

    let raw = at.ok_or_else(|| CliError::InvalidFollowUp(String::new()))?;
    let at = parse_follow_up_time(raw)?;
    let updated = db.schedule_follow_up(&scope, &lead_id, at, note).await?;
    println!(
        "Follow-up for {} set to {}",
        short_lead_id(&updated),
        at.to_rfc3339()
    );
    Ok(())
}

pub async fn run_note(
    id: &str,
    text: &[String],
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let note = text.join(" ");
    if note.trim().is_empty() {
        return Err(CliError::EmptyNote);
    }

    let context = ProfileContext::load(global_profile)?;
    let (scope, _) = context.account()?;
    let db = open_database(db_path, &context.profile).await?;
    let lead = resolve_lead(id, &scope, &db).await?;
    let Some(lead_id) = lead.id else {
        return Err(CliError::LeadNotFound(id.to_string()));
    };

    let updated = db.annotate_lead(&scope, &lead_id, &note, Utc::now()).await?;
    println!("{}", short_lead_id(&updated));
    Ok(())
}

pub async fn run_set_field(
    id: &str,
    field: &str,
    value: &str,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let (scope, _) = context.account()?;
    let db = open_database(db_path, &context.profile).await?;
    let lead = resolve_lead(id, &scope, &db).await?;
    let Some(lead_id) = lead.id else {
        return Err(CliError::LeadNotFound(id.to_string()));
    };

    let updated = db.set_field(&scope, &lead_id, field, value).await?;
    println!("{}", short_lead_id(&updated));
    Ok(())
}

pub async fn run_delete(
    id: &str,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let (scope, _) = context.account()?;
    let db = open_database(db_path, &context.profile).await?;
    let lead = resolve_lead(id, &scope, &db).await?;
    let Some(lead_id) = lead.id else {
        return Err(CliError::LeadNotFound(id.to_string()));
    };

    db.delete_lead(&scope, &lead_id).await?;
    println!("{lead_id}");
    Ok(())
}
