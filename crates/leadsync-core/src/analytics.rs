//! Dashboard aggregates computed from a lead list.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::models::comments::{extract_lead_score, extract_location};
use crate::models::{CustomKpi, Lead, STATUS_DEAL_DONE, STATUS_MEETING_DONE};
use crate::query::parse_created_time;
use crate::util::same_label;

/// Bucket name for leads with no status, platform or location
pub const UNKNOWN_BUCKET: &str = "Unknown";

/// Locations shown in the location chart
pub const TOP_LOCATIONS: usize = 6;

/// Longest daily series `leads_by_day` builds
pub const MAX_SERIES_DAYS: u32 = 366;

/// One named value in a chart series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: usize,
}

impl ChartPoint {
    fn new(name: impl Into<String>, value: usize) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Headline figure shown as a KPI card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiCard {
    pub title: String,
    pub value: usize,
    pub color: String,
    pub icon: String,
    /// Set for user-defined KPIs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
}

/// Summary row above the charts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_leads: usize,
    /// Deal Done share of all leads, in whole percent
    pub conversion_rate: u32,
    pub top_platform: Option<String>,
    pub top_location: Option<String>,
    pub average_lead_score: u32,
}

/// Lead count per status, largest first
#[must_use]
pub fn count_by_status(leads: &[Lead]) -> Vec<ChartPoint> {
    count_by(leads.iter().map(|lead| lead.lead_status.as_str()))
}

/// Lead count per platform, largest first
#[must_use]
pub fn count_by_platform(leads: &[Lead]) -> Vec<ChartPoint> {
    count_by(leads.iter().map(|lead| lead.platform.as_str()))
}

fn count_by<'a>(values: impl Iterator<Item = &'a str>) -> Vec<ChartPoint> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in values {
        let value = value.trim();
        let key = if value.is_empty() { UNKNOWN_BUCKET } else { value };
        *counts.entry(key.to_string()).or_default() += 1;
    }
    sorted_points(counts)
}

fn sorted_points(counts: BTreeMap<String, usize>) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = counts
        .into_iter()
        .map(|(name, value)| ChartPoint::new(name, value))
        .collect();
    // Stable: ties stay alphabetical
    points.sort_by(|a, b| b.value.cmp(&a.value));
    points
}

/// Leads created on each of the last `days` days, oldest first.
///
/// Every day in the window appears, labelled `MMM dd`. Leads outside the
/// window or with an unparseable creation time are ignored.
/// The window is capped at `MAX_SERIES_DAYS`.
#[must_use]
pub fn leads_by_day(leads: &[Lead], days: u32, today: NaiveDate) -> Vec<ChartPoint> {
    let mut buckets: BTreeMap<NaiveDate, usize> = (0..days.min(MAX_SERIES_DAYS))
        .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
        .map(|date| (date, 0))
        .collect();

    for lead in leads {
        let Some(created) = parse_created_time(&lead.created_time) else {
            continue;
        };
        if let Some(count) = buckets.get_mut(&created.date_naive()) {
            *count += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(date, value)| ChartPoint::new(date.format("%b %d").to_string(), value))
        .collect()
}

/// The most common comment locations, at most six
#[must_use]
pub fn top_locations(leads: &[Lead]) -> Vec<ChartPoint> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for lead in leads {
        let location =
            extract_location(&lead.comments).unwrap_or_else(|| UNKNOWN_BUCKET.to_string());
        *counts.entry(location).or_default() += 1;
    }
    let mut points = sorted_points(counts);
    points.truncate(TOP_LOCATIONS);
    points
}

/// Rounded mean of the positive lead scores; 0 when there are none
#[must_use]
pub fn average_lead_score(leads: &[Lead]) -> u32 {
    let scores: Vec<u64> = leads
        .iter()
        .filter_map(|lead| extract_lead_score(&lead.comments))
        .filter(|score| *score > 0)
        .map(u64::from)
        .collect();
    if scores.is_empty() {
        return 0;
    }
    let count = scores.len() as u64;
    let sum: u64 = scores.iter().sum();
    // Round half up
    u32::try_from((sum * 2 + count) / (count * 2)).unwrap_or(u32::MAX)
}

/// Leads whose status equals `status`, ignoring case
#[must_use]
pub fn count_with_status(leads: &[Lead], status: &str) -> usize {
    leads
        .iter()
        .filter(|lead| same_label(&lead.lead_status, status))
        .count()
}

/// Built-in KPI cards followed by one card per custom KPI
#[must_use]
pub fn kpi_cards(leads: &[Lead], custom: &[CustomKpi]) -> Vec<KpiCard> {
    let builtin = [
        ("Total Leads", leads.len(), "blue", "users"),
        (
            STATUS_MEETING_DONE,
            count_with_status(leads, STATUS_MEETING_DONE),
            "orange",
            "check",
        ),
        (
            STATUS_DEAL_DONE,
            count_with_status(leads, STATUS_DEAL_DONE),
            "green",
            "trophy",
        ),
    ];

    builtin
        .into_iter()
        .map(|(title, value, color, icon)| KpiCard {
            title: title.to_string(),
            value,
            color: color.to_string(),
            icon: icon.to_string(),
            custom_id: None,
        })
        .chain(custom.iter().map(|kpi| KpiCard {
            title: kpi.label.clone(),
            value: count_with_status(leads, &kpi.label),
            color: kpi.color.clone(),
            icon: kpi.icon.clone(),
            custom_id: Some(kpi.id.clone()),
        }))
        .collect()
}

/// Totals, conversion rate and leaders for the summary row
#[must_use]
pub fn summary(leads: &[Lead]) -> Summary {
    let total_leads = leads.len();
    let deals = count_with_status(leads, STATUS_DEAL_DONE);
    let conversion_rate = if total_leads == 0 {
        0
    } else {
        u32::try_from((deals * 200 + total_leads) / (total_leads * 2)).unwrap_or(100)
    };

    Summary {
        total_leads,
        conversion_rate,
        top_platform: count_by_platform(leads)
            .into_iter()
            .next()
            .map(|point| point.name.to_uppercase()),
        top_location: top_locations(leads).into_iter().next().map(|point| point.name),
        average_lead_score: average_lead_score(leads),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lead(status: &str, platform: &str, created: &str, comments: &str) -> Lead {
        Lead {
            lead_status: status.to_string(),
            platform: platform.to_string(),
            created_time: created.to_string(),
            comments: comments.to_string(),
            ..Lead::default()
        }
    }

    fn sample() -> Vec<Lead> {
        vec![
            lead("New Lead", "fb", "2024-03-10T08:00:00Z", "📍 Location: Pune\n🏆 Lead Score: 80"),
            lead("Deal Done", "ig", "2024-03-10T12:00:00Z", "📍 Location: Pune\n🏆 Lead Score: 91"),
            lead("deal done", "fb", "2024-03-08 09:00:00", "📍 Location: Delhi"),
            lead("", "", "garbage", "🏆 Lead Score: 0"),
        ]
    }

    #[test]
    fn counts_group_empty_values_as_unknown() {
        assert_eq!(
            count_by_status(&sample()),
            vec![
                ChartPoint::new("Deal Done", 1),
                ChartPoint::new("New Lead", 1),
                ChartPoint::new("Unknown", 1),
                ChartPoint::new("deal done", 1),
            ]
        );
        assert_eq!(
            count_by_platform(&sample()),
            vec![
                ChartPoint::new("fb", 2),
                ChartPoint::new("Unknown", 1),
                ChartPoint::new("ig", 1),
            ]
        );
    }

    #[test]
    fn leads_by_day_fills_window() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let series = leads_by_day(&sample(), 3, today);
        assert_eq!(
            series,
            vec![
                ChartPoint::new("Mar 08", 1),
                ChartPoint::new("Mar 09", 0),
                ChartPoint::new("Mar 10", 2),
            ]
        );
        assert!(leads_by_day(&sample(), 0, today).is_empty());
        assert_eq!(
            leads_by_day(&sample(), u32::MAX, today).len(),
            MAX_SERIES_DAYS as usize
        );
    }

    #[test]
    fn top_locations_are_capped() {
        let mut leads: Vec<Lead> = (0..8)
            .map(|n| lead("", "", "", &format!("📍 Location: City {n}")))
            .collect();
        leads.extend(sample());

        let top = top_locations(&leads);
        assert_eq!(top.len(), TOP_LOCATIONS);
        assert_eq!(top[0], ChartPoint::new("Pune", 2));
    }

    #[test]
    fn average_score_ignores_missing_and_zero() {
        assert_eq!(average_lead_score(&sample()), 86);
        assert_eq!(average_lead_score(&[]), 0);
    }

    #[test]
    fn kpi_cards_include_custom_kpis() {
        let custom = vec![CustomKpi {
            id: "k1".to_string(),
            label: "new lead".to_string(),
            color: "purple".to_string(),
            icon: "star".to_string(),
        }];
        let cards = kpi_cards(&sample(), &custom);
        let values: Vec<(&str, usize)> = cards
            .iter()
            .map(|card| (card.title.as_str(), card.value))
            .collect();
        assert_eq!(
            values,
            vec![
                ("Total Leads", 4),
                ("Meeting Done", 0),
                ("Deal Done", 2),
                ("new lead", 1),
            ]
        );
        assert_eq!(cards[3].custom_id.as_deref(), Some("k1"));
    }

    #[test]
    fn summary_reports_leaders() {
        let summary = summary(&sample());
        assert_eq!(summary.total_leads, 4);
        assert_eq!(summary.conversion_rate, 50);
        assert_eq!(summary.top_platform.as_deref(), Some("FB"));
        assert_eq!(summary.top_location.as_deref(), Some("Pune"));
        assert_eq!(summary.average_lead_score, 86);
    }
}
