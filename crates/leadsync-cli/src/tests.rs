use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{TimeZone, Utc};
use clap::Parser;
use leadsync_core::csv::ExportFormat as CoreExportFormat;
use leadsync_core::models::{AccountScope, FieldKind, Lead};
use leadsync_core::services::DatabaseService;
use leadsync_core::Error as CoreError;

use crate::cli::{Cli, Commands, CompletionShell, FieldKindArg, SortArg};
use crate::commands::common::{
    format_lead_lines, parse_follow_up_time, resolve_lead, short_lead_id, truncate,
};
use crate::commands::completions::run_completions;
use crate::commands::config::{apply_profile_update, missing_profile_fields, ProfileUpdate};
use crate::commands::customize::field_kind;
use crate::commands::list::ListOptions;
use crate::commands::show::format_lead_detail;
use crate::commands::stats::format_chart_lines;
use crate::commands::sync::{source_warning, MISSING_SHEET_MESSAGE};
use crate::commands::transfer::resolve_export_path;
use crate::config_profiles::CliProfile;
use crate::error::CliError;

#[test]
fn parse_follow_up_time_accepts_common_formats() {
    assert_eq!(
        parse_follow_up_time("2024-03-01T09:30:00+05:30").unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 1, 4, 0, 0).unwrap()
    );
    assert_eq!(
        parse_follow_up_time("2024-03-01 14:15").unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 1, 14, 15, 0).unwrap()
    );
    assert_eq!(
        parse_follow_up_time(" 2024-03-01 ").unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    );
    assert!(matches!(
        parse_follow_up_time("tomorrow"),
        Err(CliError::InvalidFollowUp(_))
    ));
}

#[test]
fn truncate_collapses_whitespace_and_adds_ellipsis() {
    assert_eq!(truncate("  short  name ", 20), "short name");
    assert_eq!(
        truncate("This is a very long lead name indeed", 20),
        "This is a very lo..."
    );
}

#[test]
fn format_lead_lines_show_dash_for_missing_values() {
    let lead = Lead::new("", "+919876543210", "2024-01-01T10:00:00Z");
    let lines = format_lead_lines(&[lead]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("+919876543210"));
    assert!(lines[0].contains("New Lead"));
    assert!(lines[0].contains(" - "));
}

#[test]
fn format_lead_detail_lists_comment_fields_and_notes() {
    let mut lead = Lead::new("Asha", "+919876543210", "2024-01-01T10:00:00Z");
    lead.comments = "📢 Spring ad 👤 Asha 📍 Location: Pune".to_string();
    lead.extra
        .insert("notes".to_string(), "[2024-01-02 10:00] called".into());
    lead.extra.insert("budget".to_string(), 5000.into());

    let lines = format_lead_detail(&lead);
    assert!(lines.contains(&"  Ad Details: Spring ad".to_string()));
    assert!(lines.contains(&"  Name: Asha".to_string()));
    assert!(lines.contains(&"  budget: 5000".to_string()));
    assert!(lines.contains(&"  [2024-01-02 10:00] called".to_string()));
    assert!(!lines.iter().any(|line| line.starts_with("  notes:")));
}

#[test]
fn format_chart_lines_scale_bars() {
    let points = leadsync_core::analytics::count_by_platform(&[
        Lead {
            platform: "fb".to_string(),
            ..Lead::default()
        },
        Lead {
            platform: "fb".to_string(),
            ..Lead::default()
        },
        Lead {
            platform: "ig".to_string(),
            ..Lead::default()
        },
    ]);
    let lines = format_chart_lines(&points);
    assert!(lines[0].ends_with(&"#".repeat(30)));
    assert!(lines[1].ends_with(&format!(" {}", "#".repeat(15))));
}

#[test]
fn source_warning_maps_http_500_to_friendly_message() {
    let missing = CoreError::SourceUnavailable {
        status: Some(500),
        message: "boom".to_string(),
    };
    assert_eq!(source_warning(&missing), MISSING_SHEET_MESSAGE);

    let timeout = CoreError::source_unavailable("timed out");
    assert!(source_warning(&timeout).contains("timed out"));
}

#[test]
fn resolve_export_path_handles_stdout_and_default() {
    assert_eq!(
        resolve_export_path(Some(Path::new("-")), CoreExportFormat::Csv),
        None
    );
    assert_eq!(
        resolve_export_path(Some(Path::new("out.csv")), CoreExportFormat::Csv),
        Some(PathBuf::from("out.csv"))
    );

    let default = resolve_export_path(None, CoreExportFormat::Json).unwrap();
    let name = default.to_string_lossy();
    assert!(name.starts_with("leads_export_"));
    assert!(name.ends_with(".json"));
}

#[test]
fn apply_profile_update_validates_values() {
    let mut profile = CliProfile::default();
    apply_profile_update(
        &mut profile,
        ProfileUpdate {
            leads_endpoint: Some(" https://leads.example.com/fetch/ ".to_string()),
            sheet_id: Some("sheet-1".to_string()),
            timeout_secs: Some(12),
            unique_leads: Some(true),
        },
    )
    .unwrap();
    assert_eq!(
        profile.leads_endpoint.as_deref(),
        Some("https://leads.example.com/fetch")
    );
    assert_eq!(profile.request_timeout_secs, Some(12));
    assert!(profile.unique_leads);

    assert!(apply_profile_update(
        &mut profile,
        ProfileUpdate {
            leads_endpoint: Some("leads.example.com".to_string()),
            ..ProfileUpdate::default()
        },
    )
    .is_err());
    assert!(apply_profile_update(
        &mut profile,
        ProfileUpdate {
            timeout_secs: Some(0),
            ..ProfileUpdate::default()
        },
    )
    .is_err());
}

#[test]
fn missing_profile_fields_reports_phone_first() {
    let profile = CliProfile {
        leads_endpoint: Some("https://leads.example.com".to_string()),
        sheet_id: Some("sheet".to_string()),
        ..CliProfile::default()
    };
    let missing = missing_profile_fields(&profile);
    assert_eq!(missing.len(), 1);
    assert!(missing[0].starts_with("phone_number"));
}

#[test]
fn list_options_map_to_query() {
    let query = ListOptions {
        search: Some("pune".to_string()),
        status: None,
        platform: Some("all".to_string()),
        sort: SortArg::Oldest,
        page: 2,
        page_size: 5,
    }
    .into_query();
    assert_eq!(query.sort, leadsync_core::query::SortOrder::Oldest);
    assert_eq!(query.page, 2);
    assert_eq!(query.page_size, 5);
}

#[test]
fn field_kind_maps_every_variant() {
    assert_eq!(field_kind(FieldKindArg::Text), FieldKind::Text);
    assert_eq!(field_kind(FieldKindArg::Number), FieldKind::Number);
    assert_eq!(field_kind(FieldKindArg::Date), FieldKind::Date);
    assert_eq!(field_kind(FieldKindArg::Boolean), FieldKind::Boolean);
}

#[test]
fn follow_up_requires_at_unless_clearing() {
    assert!(Cli::try_parse_from(["leadsync", "follow-up", "0190"]).is_err());
    assert!(Cli::try_parse_from(["leadsync", "follow-up", "0190", "--clear"]).is_ok());
    assert!(
        Cli::try_parse_from(["leadsync", "follow-up", "0190", "--clear", "--at", "2024-01-01"])
            .is_err()
    );

    let cli = Cli::try_parse_from([
        "leadsync",
        "--profile",
        "work",
        "list",
        "--status",
        "Deal Done",
        "--sort",
        "name",
    ])
    .unwrap();
    assert_eq!(cli.profile.as_deref(), Some("work"));
    assert!(matches!(
        cli.command,
        Some(Commands::List {
            sort: SortArg::Name,
            ..
        })
    ));
}

#[test]
fn stats_days_is_bounded() {
    assert!(Cli::try_parse_from(["leadsync", "stats", "--days", "4000000000"]).is_err());
    assert!(Cli::try_parse_from(["leadsync", "stats", "--days", "0"]).is_err());

    let cli = Cli::try_parse_from(["leadsync", "stats", "--days", "366"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Stats { days: 366, .. })));
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn resolve_lead_accepts_unique_prefix() {
    let db_path = unique_test_db_path();
    let db = DatabaseService::open_path(&db_path).await.unwrap();
    let scope = AccountScope::from_phone("9876543210").unwrap();

    let first = db
        .insert_lead(&scope, &Lead::new("A", "+911", "2024-01-01"))
        .await
        .unwrap();
    db.insert_lead(&scope, &Lead::new("B", "+912", "2024-01-02"))
        .await
        .unwrap();

    let full_id = first.id.clone().unwrap().to_string();
    let resolved = resolve_lead(&full_id, &scope, &db).await.unwrap();
    assert_eq!(resolved.name, "A");

    // UUIDv7 ids created together share a timestamp prefix
    let ambiguous = resolve_lead(&full_id[..4], &scope, &db).await;
    assert!(matches!(ambiguous, Err(CliError::AmbiguousLeadId(_))));

    let missing = resolve_lead("ffffffff", &scope, &db).await;
    assert!(matches!(missing, Err(CliError::LeadNotFound(_))));

    let other_scope = AccountScope::from_phone("9123456780").unwrap();
    assert!(resolve_lead(&full_id, &other_scope, &db).await.is_err());
    assert!(matches!(
        resolve_lead("  ", &scope, &db).await,
        Err(CliError::EmptyLeadId)
    ));
    assert_eq!(short_lead_id(&resolved).len(), 13);

    drop(db);
    cleanup_db_files(&db_path);
}

#[test]
fn completions_script_uses_binary_name() {
    let output_path = std::env::temp_dir().join(format!(
        "leadsync-completions-{}.bash",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_nanos())
    ));

    run_completions(CompletionShell::Bash, Some(&output_path)).unwrap();

    let script = std::fs::read_to_string(&output_path).unwrap();
    assert!(script.contains("_leadsync()"));
    assert!(script.contains("complete -F _leadsync"));

    let _ = std::fs::remove_file(output_path);
}

fn unique_test_db_path() -> PathBuf {
    static NEXT_TEST_DB_ID: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    let sequence = NEXT_TEST_DB_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("leadsync-cli-test-{timestamp}-{sequence}.db"))
}

fn cleanup_db_files(path: &Path) {
    // On Windows, libsql can keep file handles alive briefly after drop.
    if cfg!(windows) {
        return;
    }

    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_file(path.with_extension("db-shm"));
    let _ = std::fs::remove_file(path.with_extension("db-wal"));
}
