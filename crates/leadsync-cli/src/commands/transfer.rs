use std::path::{Path, PathBuf};

use chrono::Utc;
use leadsync_core::csv::{
    parse_csv, render_csv, render_json, suggested_export_file_name,
    ExportFormat as CoreExportFormat,
};

use crate::cli::ExportFormat;
use crate::commands::common::{open_database, ProfileContext};
use crate::error::CliError;

pub async fn run_import(
    csv_path: &Path,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let (scope, _) = context.account()?;

    let raw = std::fs::read_to_string(csv_path)?;
    let leads = parse_csv(&raw)?;

    let db = open_database(db_path, &context.profile).await?;
    let summary = db.import_leads(&scope, leads).await?;
    println!(
        "Imported {} leads ({} already stored)",
        summary.imported, summary.skipped
    );
    Ok(())
}

pub async fn run_export(
    format: ExportFormat,
    output_path: Option<&Path>,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let (scope, _) = context.account()?;
    let db = open_database(db_path, &context.profile).await?;

    let leads = db.list_leads(&scope).await?;
    let format = match format {
        ExportFormat::Csv => CoreExportFormat::Csv,
        ExportFormat::Json => CoreExportFormat::Json,
    };
    let rendered = match format {
        CoreExportFormat::Csv => render_csv(&leads),
        CoreExportFormat::Json => render_json(&leads)?,
    };

    match resolve_export_path(output_path, format) {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            println!("{}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// `-` means stdout; no path means the dated default file name
pub fn resolve_export_path(output_path: Option<&Path>, format: CoreExportFormat) -> Option<PathBuf> {
    match output_path {
        Some(path) if path.as_os_str() == "-" => None,
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from(suggested_export_file_name(
            Utc::now().date_naive(),
            format,
        ))),
    }
}
