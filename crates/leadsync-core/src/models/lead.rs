//! Lead model

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::util::same_label;

/// Built-in status for freshly captured leads
pub const STATUS_NEW_LEAD: &str = "New Lead";
/// Built-in status once a meeting happened
pub const STATUS_MEETING_DONE: &str = "Meeting Done";
/// Built-in status for closed deals
pub const STATUS_DEAL_DONE: &str = "Deal Done";

/// Statuses every account has, before custom pipeline stages.
pub const BUILTIN_STATUSES: [&str; 3] = [STATUS_NEW_LEAD, STATUS_MEETING_DONE, STATUS_DEAL_DONE];

/// Check whether a label is one of the built-in statuses (case-insensitive).
pub fn is_builtin_status(label: &str) -> bool {
    BUILTIN_STATUSES
        .iter()
        .any(|status| same_label(status, label))
}

/// Store-assigned lead identifier, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeadId(Uuid);

impl LeadId {
    /// Create a new unique lead ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for LeadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LeadId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// One inbound contact/prospect.
///
/// Known fields are typed; anything else the source or the user attaches is
/// kept verbatim in `extra` and flattened back out on serialization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Lead {
    /// Assigned by the store on insert
    #[serde(
        default,
        deserialize_with = "lenient_lead_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<LeadId>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(
        rename = "whatsapp_number_",
        default,
        deserialize_with = "lenient_string"
    )]
    pub contact_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub comments: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub platform: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lead_status: String,
    /// Origin-supplied timestamp string, kept exactly as received
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_time: String,
    /// Custom and unknown fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Lead {
    /// Create an unsaved lead with the minimum identity fields
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        contact_number: impl Into<String>,
        created_time: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            contact_number: contact_number.into(),
            created_time: created_time.into(),
            lead_status: STATUS_NEW_LEAD.to_string(),
            ..Self::default()
        }
    }

    /// Identity key used by sync deduplication
    #[must_use]
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(&self.contact_number, &self.created_time)
    }

    /// Read an extra field rendered as plain text
    #[must_use]
    pub fn extra_text(&self, key: &str) -> Option<String> {
        self.extra.get(key).map(value_to_text)
    }
}

/// Render a JSON scalar the way a spreadsheet cell would show it
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(value_to_text).unwrap_or_default())
}

fn lenient_lead_id<'de, D>(deserializer: D) -> std::result::Result<Option<LeadId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse().ok()))
}

/// Deterministic dedup identity: `{contact_number}_{created_time}`.
///
/// Two leads with the same pair are the same lead whatever else differs.
/// Distinct inquiries sharing both values collapse, and a source that
/// reformats timestamps produces new keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    #[must_use]
    pub fn new(contact_number: &str, created_time: &str) -> Self {
        Self(format!("{contact_number}_{created_time}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Addressable lead field for single-field updates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadField {
    Name,
    ContactNumber,
    Comments,
    Platform,
    LeadStatus,
    CreatedTime,
    /// Any key stored in the extra map
    Custom(String),
}

impl LeadField {
    /// Wire name of the field
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Name => "name",
            Self::ContactNumber => "whatsapp_number_",
            Self::Comments => "comments",
            Self::Platform => "platform",
            Self::LeadStatus => "lead_status",
            Self::CreatedTime => "created_time",
            Self::Custom(key) => key,
        }
    }
}

impl FromStr for LeadField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim();
        if key.is_empty() {
            return Err(Error::InvalidInput("field name cannot be empty".into()));
        }
        Ok(match key.to_ascii_lowercase().as_str() {
            "name" => Self::Name,
            "whatsapp_number_" | "contact_number" | "contact" => Self::ContactNumber,
            "comments" => Self::Comments,
            "platform" => Self::Platform,
            "lead_status" | "status" => Self::LeadStatus,
            "created_time" => Self::CreatedTime,
            "id" => return Err(Error::InvalidInput("lead id cannot be updated".into())),
            _ => Self::Custom(key.to_string()),
        })
    }
}

/// Partial update applied to a stored lead
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeadPatch {
    pub name: Option<String>,
    pub contact_number: Option<String>,
    pub comments: Option<String>,
    pub platform: Option<String>,
    pub lead_status: Option<String>,
    pub created_time: Option<String>,
    /// `Value::Null` removes the key
    pub extra: BTreeMap<String, Value>,
}

impl LeadPatch {
    /// Patch touching exactly one field
    #[must_use]
    pub fn field(field: LeadField, value: Value) -> Self {
        let mut patch = Self::default();
        match field {
            LeadField::Name => patch.name = Some(value_to_text(&value)),
            LeadField::ContactNumber => patch.contact_number = Some(value_to_text(&value)),
            LeadField::Comments => patch.comments = Some(value_to_text(&value)),
            LeadField::Platform => patch.platform = Some(value_to_text(&value)),
            LeadField::LeadStatus => patch.lead_status = Some(value_to_text(&value)),
            LeadField::CreatedTime => patch.created_time = Some(value_to_text(&value)),
            LeadField::Custom(key) => {
                patch.extra.insert(key, value);
            }
        }
        patch
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.contact_number.is_none()
            && self.comments.is_none()
            && self.platform.is_none()
            && self.lead_status.is_none()
            && self.created_time.is_none()
            && self.extra.is_empty()
    }

    /// Apply the patch in place; untouched fields keep their values.
    pub fn apply(self, lead: &mut Lead) {
        if let Some(name) = self.name {
            lead.name = name;
        }
        if let Some(contact_number) = self.contact_number {
            lead.contact_number = contact_number;
        }
        if let Some(comments) = self.comments {
            lead.comments = comments;
        }
        if let Some(platform) = self.platform {
            lead.platform = platform;
        }
        if let Some(lead_status) = self.lead_status {
            lead.lead_status = lead_status;
        }
        if let Some(created_time) = self.created_time {
            lead.created_time = created_time;
        }
        for (key, value) in self.extra {
            if value.is_null() {
                lead.extra.remove(&key);
            } else {
                lead.extra.insert(key, value);
            }
        }
    }
}
