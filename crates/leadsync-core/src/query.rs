//! Search, filter, sort and paginate a lead list in memory.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::Lead;

/// Rows per page in lead listings
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Filter value meaning "no filter"
pub const FILTER_ALL: &str = "all";

/// Lead list ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Name,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" | "new" => Ok(Self::Newest),
            "oldest" | "old" => Ok(Self::Oldest),
            "name" => Ok(Self::Name),
            other => Err(Error::InvalidInput(format!(
                "unknown sort order: {other} (expected newest, oldest or name)"
            ))),
        }
    }
}

/// Search and filter criteria for a lead listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub platform: Option<String>,
    pub sort: SortOrder,
    /// 1-based
    pub page: usize,
    pub page_size: usize,
}

impl Default for LeadQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            platform: None,
            sort: SortOrder::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of a filtered listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadPage {
    pub leads: Vec<Lead>,
    /// Leads matching the filters across all pages
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}

impl LeadQuery {
    /// Whether a lead passes the search and filters.
    ///
    /// Search is case-insensitive over name and comments and a plain
    /// substring match on the contact number.
    #[must_use]
    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(term) = active(self.search.as_deref()) {
            let needle = term.to_lowercase();
            let hit = lead.name.to_lowercase().contains(&needle)
                || lead.comments.to_lowercase().contains(&needle)
                || lead.contact_number.contains(term);
            if !hit {
                return false;
            }
        }
        if let Some(status) = active_filter(self.status.as_deref()) {
            if lead.lead_status != status {
                return false;
            }
        }
        if let Some(platform) = active_filter(self.platform.as_deref()) {
            if lead.platform != platform {
                return false;
            }
        }
        true
    }

    /// Filter, sort and cut one page out of `leads`.
    ///
    /// Pages past the end come back empty; page 0 is treated as page 1.
    #[must_use]
    pub fn apply(&self, leads: &[Lead]) -> LeadPage {
        let mut matching: Vec<&Lead> = leads.iter().filter(|lead| self.matches(lead)).collect();
        sort_leads(&mut matching, self.sort);

        let page_size = self.page_size.max(1);
        let total = matching.len();
        let page = self.page.max(1);
        let leads = matching
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect();

        LeadPage {
            leads,
            total,
            page,
            total_pages: total.div_ceil(page_size),
        }
    }
}

fn active(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn active_filter(value: Option<&str>) -> Option<&str> {
    active(value).filter(|value| !value.eq_ignore_ascii_case(FILTER_ALL))
}

fn sort_leads(leads: &mut [&Lead], order: SortOrder) {
    match order {
        SortOrder::Newest => leads.sort_by(|a, b| compare_created(a, b, true)),
        SortOrder::Oldest => leads.sort_by(|a, b| compare_created(a, b, false)),
        SortOrder::Name => leads.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| compare_created(a, b, true))
        }),
    }
}

/// Order by creation time; leads without a parseable time go last
/// in either direction.
fn compare_created(a: &Lead, b: &Lead, descending: bool) -> Ordering {
    match (
        parse_created_time(&a.created_time),
        parse_created_time(&b.created_time),
    ) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Parse a lead's `created_time`.
///
/// Accepts RFC 3339 and naive `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS`
/// (read as UTC).
#[must_use]
pub fn parse_created_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Distinct non-empty statuses, sorted, for filter menus
#[must_use]
pub fn distinct_statuses(leads: &[Lead]) -> Vec<String> {
    distinct(leads.iter().map(|lead| lead.lead_status.as_str()))
}

/// Distinct non-empty platforms, sorted, for filter menus
#[must_use]
pub fn distinct_platforms(leads: &[Lead]) -> Vec<String> {
    distinct(leads.iter().map(|lead| lead.platform.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|value| !value.trim().is_empty())
        .map(ToString::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lead(name: &str, contact: &str, created: &str, status: &str, platform: &str) -> Lead {
        Lead {
            name: name.to_string(),
            contact_number: contact.to_string(),
            created_time: created.to_string(),
            lead_status: status.to_string(),
            platform: platform.to_string(),
            ..Lead::default()
        }
    }

    fn sample() -> Vec<Lead> {
        vec![
            lead("Asha", "+919000000001", "2024-01-02T10:00:00Z", "New Lead", "fb"),
            lead("ravi", "+919000000002", "2024-01-05 09:00:00", "Deal Done", "ig"),
            lead("Meera", "+919000000003", "not a date", "New Lead", "ig"),
            lead("Bala", "+919000000004", "2024-01-03T10:00:00+05:30", "Meeting Done", "fb"),
        ]
    }

    fn names(page: &LeadPage) -> Vec<&str> {
        page.leads.iter().map(|lead| lead.name.as_str()).collect()
    }

    #[test]
    fn default_sort_is_newest_first_with_unparseable_last() {
        let page = LeadQuery::default().apply(&sample());
        assert_eq!(names(&page), vec!["ravi", "Bala", "Asha", "Meera"]);
        assert_eq!(page.total, 4);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn oldest_and_name_orders() {
        let oldest = LeadQuery {
            sort: SortOrder::Oldest,
            ..LeadQuery::default()
        }
        .apply(&sample());
        assert_eq!(names(&oldest), vec!["Asha", "Bala", "ravi", "Meera"]);

        let by_name = LeadQuery {
            sort: SortOrder::Name,
            ..LeadQuery::default()
        }
        .apply(&sample());
        assert_eq!(names(&by_name), vec!["Asha", "Bala", "Meera", "ravi"]);
    }

    #[test]
    fn name_ties_fall_back_to_newest_with_unparseable_last() {
        let leads = vec![
            lead("Asha", "+1", "garbage", "New Lead", "fb"),
            lead("asha", "+2", "2024-01-01T00:00:00Z", "New Lead", "fb"),
            lead("Asha", "+3", "2024-01-09T00:00:00Z", "New Lead", "fb"),
        ];
        let page = LeadQuery {
            sort: SortOrder::Name,
            ..LeadQuery::default()
        }
        .apply(&leads);
        let contacts: Vec<&str> = page
            .leads
            .iter()
            .map(|lead| lead.contact_number.as_str())
            .collect();
        assert_eq!(contacts, vec!["+3", "+2", "+1"]);
    }

    #[test]
    fn search_covers_name_comments_and_number() {
        let mut leads = sample();
        leads[2].comments = "📍 Location: PUNE".to_string();

        let query = |term: &str| LeadQuery {
            search: Some(term.to_string()),
            ..LeadQuery::default()
        };
        assert_eq!(names(&query("RAVI").apply(&leads)), vec!["ravi"]);
        assert_eq!(names(&query("pune").apply(&leads)), vec!["Meera"]);
        assert_eq!(names(&query("0004").apply(&leads)), vec!["Bala"]);
        assert_eq!(query("   ").apply(&leads).total, 4);
    }

    #[test]
    fn filters_are_exact_and_all_means_none() {
        let query = LeadQuery {
            status: Some("New Lead".to_string()),
            platform: Some("ig".to_string()),
            ..LeadQuery::default()
        };
        assert_eq!(names(&query.apply(&sample())), vec!["Meera"]);

        let query = LeadQuery {
            status: Some("all".to_string()),
            platform: Some("ALL".to_string()),
            ..LeadQuery::default()
        };
        assert_eq!(query.apply(&sample()).total, 4);

        let query = LeadQuery {
            status: Some("new lead".to_string()),
            ..LeadQuery::default()
        };
        assert_eq!(query.apply(&sample()).total, 0);
    }

    #[test]
    fn pagination_is_one_based() {
        let leads: Vec<Lead> = (0..45)
            .map(|day| {
                lead(
                    &format!("Lead {day}"),
                    &format!("+91{day}"),
                    &format!("2024-02-{:02}T00:00:00Z", day % 28 + 1),
                    "New Lead",
                    "fb",
                )
            })
            .collect();

        let first = LeadQuery::default().apply(&leads);
        assert_eq!(first.leads.len(), 20);
        assert_eq!(first.total_pages, 3);

        let last = LeadQuery {
            page: 3,
            ..LeadQuery::default()
        }
        .apply(&leads);
        assert_eq!(last.leads.len(), 5);

        let past_end = LeadQuery {
            page: 9,
            ..LeadQuery::default()
        }
        .apply(&leads);
        assert!(past_end.leads.is_empty());
        assert_eq!(past_end.total, 45);

        let huge = LeadQuery {
            page: usize::MAX,
            page_size: usize::MAX,
            ..LeadQuery::default()
        }
        .apply(&leads);
        assert!(huge.leads.is_empty());
        assert_eq!(huge.page, usize::MAX);
    }

    #[test]
    fn parse_created_time_formats() {
        assert!(parse_created_time("2024-01-02T10:00:00Z").is_some());
        assert!(parse_created_time("2024-01-02T10:00:00+05:30").is_some());
        assert!(parse_created_time("2024-01-02 10:00:00").is_some());
        assert!(parse_created_time("2024-01-02T10:00:00").is_some());
        assert_eq!(parse_created_time("yesterday"), None);
        assert_eq!(parse_created_time(""), None);
    }

    #[test]
    fn distinct_values_are_sorted_and_skip_empty() {
        let mut leads = sample();
        leads.push(lead("X", "+1", "", "", ""));
        assert_eq!(
            distinct_statuses(&leads),
            vec!["Deal Done", "Meeting Done", "New Lead"]
        );
        assert_eq!(distinct_platforms(&leads), vec!["fb", "ig"]);
    }

    #[test]
    fn sort_order_parses() {
        assert_eq!("Oldest".parse::<SortOrder>().unwrap(), SortOrder::Oldest);
        assert!("random".parse::<SortOrder>().is_err());
    }
}
