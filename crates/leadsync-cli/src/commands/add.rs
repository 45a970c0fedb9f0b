use std::path::Path;

use leadsync_core::Lead;

use crate::commands::common::{open_database, ProfileContext};
use crate::error::CliError;

pub struct NewLead {
    pub name: String,
    pub phone: String,
    pub platform: String,
    pub status: Option<String>,
    pub comments: Option<String>,
    pub created_time: Option<String>,
}

impl NewLead {
    pub fn into_lead(self) -> Lead {
        Lead {
            name: self.name,
            contact_number: self.phone.trim().to_string(),
            platform: self.platform.trim().to_string(),
            lead_status: self.status.unwrap_or_default(),
            comments: self.comments.unwrap_or_default(),
            created_time: self.created_time.unwrap_or_default().trim().to_string(),
            ..Lead::default()
        }
    }
}

pub async fn run_add(
    new_lead: NewLead,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let (scope, _) = context.account()?;
    let db = open_database(db_path, &context.profile).await?;

    let lead = db.create_lead(&scope, new_lead.into_lead()).await?;
    if let Some(id) = lead.id {
        println!("{id}");
    }
    Ok(())
}
