//! Per-account customisation: pipeline stages, custom fields and KPI cards

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// User-defined `lead_status` value beyond the built-in statuses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStage {
    pub id: String,
    pub label: String,
    /// Ordering within the pipeline, ascending
    pub position: i64,
}

/// Value type of a custom field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Number,
    Date,
    Boolean,
}

impl FieldKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
        }
    }

    /// Convert user input into the JSON value stored on the lead.
    ///
    /// An empty input clears the field (`Value::Null`).
    pub fn coerce(self, raw: &str) -> Result<Value> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Value::Null);
        }
        match self {
            Self::Text => Ok(Value::String(raw.to_string())),
            Self::Number => raw
                .parse::<i64>()
                .map(Value::from)
                .ok()
                .or_else(|| {
                    raw.parse::<f64>()
                        .ok()
                        .filter(|number| number.is_finite())
                        .map(Value::from)
                })
                .ok_or_else(|| Error::InvalidInput(format!("'{raw}' is not a number"))),
            Self::Date => {
                let valid = NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
                    || DateTime::parse_from_rfc3339(raw).is_ok();
                if valid {
                    Ok(Value::String(raw.to_string()))
                } else {
                    Err(Error::InvalidInput(format!(
                        "'{raw}' is not a date (expected YYYY-MM-DD or RFC 3339)"
                    )))
                }
            }
            Self::Boolean => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(Value::Bool(true)),
                "0" | "false" | "no" | "off" => Ok(Value::Bool(false)),
                _ => Err(Error::InvalidInput(format!("'{raw}' is not a boolean"))),
            },
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "number" => Ok(Self::Number),
            "date" => Ok(Self::Date),
            "boolean" | "bool" => Ok(Self::Boolean),
            other => Err(Error::InvalidInput(format!("unknown field kind: {other}"))),
        }
    }
}

/// Definition of an extra field users may set on leads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: String,
    pub name: String,
    pub kind: FieldKind,
}

/// Dashboard card counting leads whose status equals `label`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomKpi {
    pub id: String,
    pub label: String,
    pub color: String,
    pub icon: String,
}

/// Partial update for a custom KPI
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustomKpiUpdate {
    pub label: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}
