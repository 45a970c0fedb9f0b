//! Structured sub-fields embedded in lead comments.
//!
//! Ad-sourced leads arrive with comments like
//! `📢 Spring ad 👤 Asha 📞 98765 📍 Location: Pune 🏆 Lead Score: 82`.
//! Each emoji starts a sub-field; their order determines the label.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Labels for the sub-fields, in marker order
const COMMENT_LABELS: [&str; 8] = [
    "Ad Details",
    "Name",
    "Number",
    "PreSchool Owner",
    "Location",
    "Fees",
    "Strength",
    "Lead Score",
];

/// Placeholder shown when a comment has no location
pub const UNKNOWN_LOCATION: &str = "N/A";

/// One labelled piece of a lead's comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentField {
    pub label: String,
    pub value: String,
}

/// Split comments on the emoji markers into labelled fields.
///
/// Pieces beyond the known labels are named `Field N`.
#[must_use]
pub fn parse_comments(comments: &str) -> Vec<CommentField> {
    static MARKERS: OnceLock<Regex> = OnceLock::new();
    let re = MARKERS.get_or_init(|| Regex::new("📢|👤|📞|📍|💰|👶|🏆").expect("Invalid regex"));
    re.split(comments)
        .map(|part| part.trim_start_matches(|c: char| c == ':' || c.is_whitespace()))
        .map(str::trim_end)
        .filter(|part| !part.is_empty())
        .enumerate()
        .map(|(index, value)| CommentField {
            label: COMMENT_LABELS
                .get(index)
                .map_or_else(|| format!("Field {}", index + 1), ToString::to_string),
            value: value.to_string(),
        })
        .collect()
}

/// Location from the `📍 Location: ...` marker, up to the end of the line
#[must_use]
pub fn extract_location(comments: &str) -> Option<String> {
    static LOCATION: OnceLock<Regex> = OnceLock::new();
    let re = LOCATION.get_or_init(|| Regex::new(r"📍 Location: ([^\n]+)").expect("Invalid regex"));
    re.captures(comments)
        .map(|cap| cap[1].trim().to_string())
        .filter(|location| !location.is_empty())
}

/// Numeric score from the `🏆 Lead Score: N` marker
#[must_use]
pub fn extract_lead_score(comments: &str) -> Option<u32> {
    static LEAD_SCORE: OnceLock<Regex> = OnceLock::new();
    let re = LEAD_SCORE.get_or_init(|| Regex::new(r"🏆 Lead Score: (\d+)").expect("Invalid regex"));
    re.captures(comments).and_then(|cap| cap[1].parse().ok())
}
