use std::path::Path;

use leadsync_core::models::comments::parse_comments;
use leadsync_core::models::{value_to_text, Lead};
use leadsync_core::services::{follow_up_at, FOLLOW_UP_AT_FIELD, FOLLOW_UP_NOTE_FIELD, NOTES_FIELD};

use crate::commands::common::{format_timestamp, open_database, resolve_lead, ProfileContext};
use crate::error::CliError;

pub async fn run_show(
    id: &str,
    as_json: bool,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let (scope, _) = context.account()?;
    let db = open_database(db_path, &context.profile).await?;
    let lead = resolve_lead(id, &scope, &db).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&lead)?);
    } else {
        for line in format_lead_detail(&lead) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn format_lead_detail(lead: &Lead) -> Vec<String> {
    let mut lines = vec![
        format!(
            "ID:          {}",
            lead.id.as_ref().map(ToString::to_string).unwrap_or_default()
        ),
        format!("Name:        {}", lead.name),
        format!("Number:      {}", lead.contact_number),
        format!("Platform:    {}", lead.platform),
        format!("Status:      {}", lead.lead_status),
        format!("Created:     {}", lead.created_time),
    ];

    if let Some(at) = follow_up_at(lead) {
        let note = lead.extra_text(FOLLOW_UP_NOTE_FIELD).unwrap_or_default();
        lines.push(format!("Follow-up:   {} {}", format_timestamp(at), note).trim_end().to_string());
    }

    let comment_fields = parse_comments(&lead.comments);
    if !comment_fields.is_empty() {
        lines.push("Comments:".to_string());
        for field in comment_fields {
            lines.push(format!("  {}: {}", field.label, field.value));
        }
    }

    let extras = lead
        .extra
        .iter()
        .filter(|(key, _)| {
            ![FOLLOW_UP_AT_FIELD, FOLLOW_UP_NOTE_FIELD, NOTES_FIELD].contains(&key.as_str())
        })
        .collect::<Vec<_>>();
    if !extras.is_empty() {
        lines.push("Fields:".to_string());
        for (key, value) in extras {
            lines.push(format!("  {key}: {}", value_to_text(value)));
        }
    }

    if let Some(notes) = lead.extra_text(NOTES_FIELD) {
        lines.push("Notes:".to_string());
        lines.extend(notes.lines().map(|line| format!("  {line}")));
    }

    lines
}
