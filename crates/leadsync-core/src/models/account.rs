//! Account scope and sync bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::util::digits_only;

/// Number of trailing digits used as the remote sheet selector
const SHEET_NAME_DIGITS: usize = 10;

/// Sync source tag recorded for spreadsheet-backed accounts
pub const SOURCE_SHEET: &str = "sheet";

/// Normalize a phone number to `+<country><number>`.
///
/// Ten bare digits are treated as an Indian local number and get `+91`;
/// 11 to 15 digits are assumed to already carry a country code.
///
/// # Examples
///
/// ```
/// use leadsync_core::models::normalize_phone;
///
/// assert_eq!(normalize_phone("98765 43210").unwrap(), "+919876543210");
/// assert_eq!(normalize_phone("+1 (415) 555-0100").unwrap(), "+14155550100");
/// ```
pub fn normalize_phone(input: &str) -> Result<String> {
    let digits = digits_only(input);
    match digits.len() {
        10 => Ok(format!("+91{digits}")),
        11..=15 => Ok(format!("+{digits}")),
        _ => Err(Error::InvalidInput(format!(
            "invalid phone number: {}",
            input.trim()
        ))),
    }
}

/// Partition key for all of one account's data: the digits of its phone number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountScope(String);

impl AccountScope {
    /// Build a scope from any phone number spelling.
    pub fn from_phone(phone: &str) -> Result<Self> {
        let normalized = normalize_phone(phone)?;
        Ok(Self(normalized.trim_start_matches('+').to_string()))
    }

    /// The digits-only scope identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last ten digits, used to select the account's sheet on the lead source
    #[must_use]
    pub fn sheet_name(&self) -> &str {
        let start = self.0.len().saturating_sub(SHEET_NAME_DIGITS);
        &self.0[start..]
    }
}

impl fmt::Display for AccountScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_phone(s)
    }
}

impl TryFrom<String> for AccountScope {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_phone(&value)
    }
}

impl From<AccountScope> for String {
    fn from(scope: AccountScope) -> Self {
        scope.0
    }
}

/// Bookkeeping upserted at the start of every sync cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMetadata {
    pub source: String,
    pub last_synced_at: DateTime<Utc>,
    pub display_name: String,
}

impl SyncMetadata {
    /// Metadata for a sheet sync happening now
    #[must_use]
    pub fn sheet_now(display_name: impl Into<String>) -> Self {
        Self {
            source: SOURCE_SHEET.to_string(),
            last_synced_at: Utc::now(),
            display_name: display_name.into(),
        }
    }
}

/// Stored account record (`account/<scope>`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub scope: AccountScope,
    pub display_name: String,
    pub source: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}
