use leadsync_core::util::{is_http_url, normalize_text_option};

use crate::cli::ConfigCommands;
use crate::commands::common::ProfileContext;
use crate::config_profiles::CliProfile;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            leads_endpoint,
            sheet_id,
            timeout_secs,
            unique_leads,
            no_activate,
        } => run_config_init(
            global_profile,
            ProfileUpdate {
                leads_endpoint,
                sheet_id,
                timeout_secs,
                unique_leads,
            },
            no_activate,
        ),
        ConfigCommands::Show => run_config_show(global_profile),
    }
}

/// Explicit values passed to `config init`
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub leads_endpoint: Option<String>,
    pub sheet_id: Option<String>,
    pub timeout_secs: Option<u64>,
    pub unique_leads: Option<bool>,
}

pub fn run_config_init(
    global_profile: Option<&str>,
    update: ProfileUpdate,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut context = ProfileContext::load(global_profile)?;
    let profile_name = context.name.clone();
    let profile = context.config.profile_mut_or_default(&profile_name);
    apply_profile_update(profile, update)?;

    if !no_activate {
        context.config.active_profile = Some(profile_name.clone());
    }

    let path = context.config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let profile = context
        .config
        .profiles
        .get(&profile_name)
        .ok_or_else(|| CliError::Config("Failed to persist profile".to_string()))?;
    let missing_fields = missing_profile_fields(profile);
    if missing_fields.is_empty() {
        println!("Profile '{profile_name}' is ready. Run `leadsync sync`.");
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }
    Ok(())
}

pub fn apply_profile_update(profile: &mut CliProfile, update: ProfileUpdate) -> Result<(), CliError> {
    if let Some(endpoint) = normalize_text_option(update.leads_endpoint) {
        if !is_http_url(&endpoint) {
            return Err(CliError::Config(
                "leads_endpoint must include http:// or https://".to_string(),
            ));
        }
        profile.leads_endpoint = Some(endpoint.trim_end_matches('/').to_string());
    }
    if let Some(sheet_id) = normalize_text_option(update.sheet_id) {
        profile.sheet_id = Some(sheet_id);
    }
    if let Some(secs) = update.timeout_secs {
        if secs == 0 {
            return Err(CliError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        profile.request_timeout_secs = Some(secs);
    }
    if let Some(unique_leads) = update.unique_leads {
        profile.unique_leads = unique_leads;
    }
    Ok(())
}

pub fn missing_profile_fields(profile: &CliProfile) -> Vec<&'static str> {
    let mut missing_fields = Vec::new();
    if profile.phone_number.is_none() {
        missing_fields.push("phone_number (run `leadsync account login`)");
    }
    if profile.leads_endpoint().is_none() {
        missing_fields.push("leads_endpoint");
    }
    if profile.sheet_id().is_none() {
        missing_fields.push("sheet_id");
    }
    missing_fields
}

fn run_config_show(global_profile: Option<&str>) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let profile = &context.profile;
    println!("profile:          {}", context.name);
    println!(
        "phone_number:     {}",
        profile.phone_number.as_deref().unwrap_or("-")
    );
    println!(
        "display_name:     {}",
        profile.display_name.as_deref().unwrap_or("-")
    );
    println!(
        "leads_endpoint:   {}",
        profile.leads_endpoint().as_deref().unwrap_or("-")
    );
    println!(
        "sheet_id:         {}",
        profile.sheet_id().as_deref().unwrap_or("-")
    );
    println!(
        "timeout:          {}s",
        profile.request_timeout().as_secs()
    );
    println!("unique_leads:     {}", profile.unique_leads);
    Ok(())
}
