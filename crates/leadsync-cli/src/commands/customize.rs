use std::path::Path;

use leadsync_core::models::{CustomKpiUpdate, FieldKind};

use crate::cli::{FieldCommands, FieldKindArg, KpiCommands, StageCommands};
use crate::commands::common::{open_database, ProfileContext};
use crate::error::CliError;

pub async fn run_stages(
    command: StageCommands,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let (scope, _) = context.account()?;
    let db = open_database(db_path, &context.profile).await?;

    match command {
        StageCommands::List => {
            for status in db.status_options(&scope).await? {
                println!("{status}");
            }
        }
        StageCommands::Add { label } => {
            let stage = db.add_stage(&scope, &label).await?;
            println!("Added stage '{}'", stage.label);
        }
        StageCommands::Remove { label } => {
            db.remove_stage(&scope, &label).await?;
            println!("Removed stage '{}'", label.trim());
        }
    }
    Ok(())
}

pub async fn run_fields(
    command: FieldCommands,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let (scope, _) = context.account()?;
    let db = open_database(db_path, &context.profile).await?;

    match command {
        FieldCommands::List => {
            let fields = db.list_fields(&scope).await?;
            if fields.is_empty() {
                println!("No custom fields defined.");
            }
            for field in fields {
                println!("{:<24}  {}", field.name, field.kind);
            }
        }
        FieldCommands::Add { name, kind } => {
            let field = db.add_field(&scope, &name, field_kind(kind)).await?;
            println!("Added field '{}' ({})", field.name, field.kind);
        }
        FieldCommands::Remove { name } => {
            db.remove_field(&scope, &name).await?;
            println!("Removed field '{}'", name.trim());
        }
    }
    Ok(())
}

pub async fn run_kpis(
    command: KpiCommands,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let (scope, _) = context.account()?;
    let db = open_database(db_path, &context.profile).await?;

    match command {
        KpiCommands::List => {
            let kpis = db.list_kpis(&scope).await?;
            if kpis.is_empty() {
                println!("No custom KPIs defined.");
            }
            for kpi in kpis {
                println!(
                    "{:<13}  {:<24}  {:<8}  {}",
                    kpi.id.chars().take(13).collect::<String>(),
                    kpi.label,
                    kpi.color,
                    kpi.icon
                );
            }
        }
        KpiCommands::Add { label, color, icon } => {
            let kpi = db.add_kpi(&scope, &label, &color, &icon).await?;
            println!("{}", kpi.id);
        }
        KpiCommands::Update {
            id,
            label,
            color,
            icon,
        } => {
            let kpi = db
                .update_kpi(&scope, &id, CustomKpiUpdate { label, color, icon })
                .await?;
            println!("Updated KPI '{}'", kpi.label);
        }
        KpiCommands::Remove { id } => {
            db.remove_kpi(&scope, &id).await?;
            println!("Removed KPI {}", id.trim());
        }
    }
    Ok(())
}

pub const fn field_kind(kind: FieldKindArg) -> FieldKind {
    match kind {
        FieldKindArg::Text => FieldKind::Text,
        FieldKindArg::Number => FieldKind::Number,
        FieldKindArg::Date => FieldKind::Date,
        FieldKindArg::Boolean => FieldKind::Boolean,
    }
}
