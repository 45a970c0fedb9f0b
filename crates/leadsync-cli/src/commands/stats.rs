use std::path::Path;

use chrono::Utc;
use leadsync_core::analytics::{
    count_by_platform, count_by_status, kpi_cards, leads_by_day, summary, top_locations,
    ChartPoint, KpiCard, Summary,
};
use serde::Serialize;

use crate::commands::common::{open_database, ProfileContext};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub summary: Summary,
    pub kpis: Vec<KpiCard>,
    pub by_status: Vec<ChartPoint>,
    pub by_platform: Vec<ChartPoint>,
    pub by_day: Vec<ChartPoint>,
    pub top_locations: Vec<ChartPoint>,
}

pub async fn run_stats(
    days: u32,
    as_json: bool,
    db_path: &Path,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = ProfileContext::load(global_profile)?;
    let (scope, _) = context.account()?;
    let db = open_database(db_path, &context.profile).await?;

    let leads = db.list_leads(&scope).await?;
    let custom_kpis = db.list_kpis(&scope).await?;
    let report = StatsReport {
        summary: summary(&leads),
        kpis: kpi_cards(&leads, &custom_kpis),
        by_status: count_by_status(&leads),
        by_platform: count_by_platform(&leads),
        by_day: leads_by_day(&leads, days, Utc::now().date_naive()),
        top_locations: top_locations(&leads),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if leads.is_empty() {
        println!("No leads stored yet. Run `leadsync sync` to fetch them.");
    } else {
        for line in format_stats_lines(&report) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn format_stats_lines(report: &StatsReport) -> Vec<String> {
    let summary = &report.summary;
    let mut lines = vec![
        format!("Total leads:      {}", summary.total_leads),
        format!("Conversion rate:  {}%", summary.conversion_rate),
        format!(
            "Top platform:     {}",
            summary.top_platform.as_deref().unwrap_or("N/A")
        ),
        format!(
            "Top location:     {}",
            summary.top_location.as_deref().unwrap_or("N/A")
        ),
        format!("Avg lead score:   {}", summary.average_lead_score),
        String::new(),
        "KPIs".to_string(),
    ];
    lines.extend(
        report
            .kpis
            .iter()
            .map(|card| format!("  {:<24} {}", card.title, card.value)),
    );

    for (title, points) in [
        ("By status", &report.by_status),
        ("By platform", &report.by_platform),
        ("Top locations", &report.top_locations),
        ("By day", &report.by_day),
    ] {
        lines.push(String::new());
        lines.push(title.to_string());
        lines.extend(format_chart_lines(points));
    }
    lines
}

pub fn format_chart_lines(points: &[ChartPoint]) -> Vec<String> {
    let max = points.iter().map(|point| point.value).max().unwrap_or(0);
    points
        .iter()
        .map(|point| {
            let width = if max == 0 { 0 } else { point.value * 30 / max };
            format!(
                "  {:<24} {:>5}  {}",
                point.name,
                point.value,
                "#".repeat(width)
            )
        })
        .collect()
}
