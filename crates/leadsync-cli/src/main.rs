//! leadsync CLI - pull sheet-sourced leads into a local store and work them
//! from the terminal.

mod cli;
mod commands;
mod config_profiles;
mod error;
#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::account::{run_account, run_accounts};
use crate::commands::add::{run_add, NewLead};
use crate::commands::common::resolve_db_path;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::customize::{run_fields, run_kpis, run_stages};
use crate::commands::list::{run_list, ListOptions};
use crate::commands::show::run_show;
use crate::commands::stats::run_stats;
use crate::commands::sync::run_sync;
use crate::commands::transfer::{run_export, run_import};
use crate::commands::update::{run_delete, run_follow_up, run_note, run_set_field, run_status};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "leadsync=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);
    let profile = cli.profile.as_deref();

    match cli.command {
        Some(Commands::Sync { json }) => run_sync(json, &db_path, profile).await?,
        Some(Commands::List {
            search,
            status,
            platform,
            sort,
            page,
            page_size,
            json,
        }) => {
            let options = ListOptions {
                search,
                status,
                platform,
                sort,
                page,
                page_size,
            };
            run_list(options, json, &db_path, profile).await?;
        }
        Some(Commands::Show { id, json }) => run_show(&id, json, &db_path, profile).await?,
        Some(Commands::Status { id, status }) => {
            run_status(&id, &status, &db_path, profile).await?;
        }
        Some(Commands::FollowUp {
            id,
            at,
            note,
            clear,
        }) => {
            run_follow_up(
                &id,
                at.as_deref(),
                note.as_deref(),
                clear,
                &db_path,
                profile,
            )
            .await?;
        }
        Some(Commands::Note { id, text }) => run_note(&id, &text, &db_path, profile).await?,
        Some(Commands::SetField { id, field, value }) => {
            run_set_field(&id, &field, &value, &db_path, profile).await?;
        }
        Some(Commands::Add {
            name,
            phone,
            platform,
            status,
            comments,
            created_time,
        }) => {
            let new_lead = NewLead {
                name,
                phone,
                platform,
                status,
                comments,
                created_time,
            };
            run_add(new_lead, &db_path, profile).await?;
        }
        Some(Commands::Delete { id }) => run_delete(&id, &db_path, profile).await?,
        Some(Commands::Import { path }) => run_import(&path, &db_path, profile).await?,
        Some(Commands::Export { format, output }) => {
            run_export(format, output.as_deref(), &db_path, profile).await?;
        }
        Some(Commands::Stats { days, json }) => run_stats(days, json, &db_path, profile).await?,
        Some(Commands::Stages { command }) => run_stages(command, &db_path, profile).await?,
        Some(Commands::Fields { command }) => run_fields(command, &db_path, profile).await?,
        Some(Commands::Kpis { command }) => run_kpis(command, &db_path, profile).await?,
        Some(Commands::Account { command }) => run_account(command, &db_path, profile).await?,
        Some(Commands::Accounts { json }) => run_accounts(json, &db_path, profile).await?,
        Some(Commands::Config { command }) => run_config(command, profile)?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        None => {
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
