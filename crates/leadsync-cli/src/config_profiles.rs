//! Persistent CLI profile configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use leadsync_core::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use leadsync_core::util::normalize_text_option;
use leadsync_core::SourceConfig;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";

pub const PROFILE_ENV: &str = "LEADSYNC_PROFILE";
pub const LEADS_ENDPOINT_ENV: &str = "LEADSYNC_LEADS_ENDPOINT";
pub const SHEET_ID_ENV: &str = "LEADSYNC_SHEET_ID";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfilesConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, CliProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfile {
    /// Normalized account phone number (`+<digits>`)
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub leads_endpoint: Option<String>,
    #[serde(default)]
    pub sheet_id: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub unique_leads: bool,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("leadsync")
        .join(CONFIG_FILE_NAME)
}

pub fn normalize_profile_name(value: Option<&str>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl CliProfilesConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path();
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        if let Some(profile) = normalize_profile_name(explicit) {
            return profile;
        }
        if let Some(profile) = normalize_profile_name(std::env::var(PROFILE_ENV).ok().as_deref()) {
            return profile;
        }
        if let Some(profile) = normalize_profile_name(self.active_profile.as_deref()) {
            return profile;
        }
        "default".to_string()
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }

    fn normalize(&mut self) {
        self.active_profile = normalize_profile_name(self.active_profile.as_deref());
        for profile in self.profiles.values_mut() {
            profile.normalize();
        }
    }
}

impl CliProfile {
    /// Endpoint from the environment, falling back to the profile
    pub fn leads_endpoint(&self) -> Option<String> {
        normalize_text_option(std::env::var(LEADS_ENDPOINT_ENV).ok())
            .or_else(|| normalize_text_option(self.leads_endpoint.clone()))
    }

    /// Sheet id from the environment, falling back to the profile
    pub fn sheet_id(&self) -> Option<String> {
        normalize_text_option(std::env::var(SHEET_ID_ENV).ok())
            .or_else(|| normalize_text_option(self.sheet_id.clone()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Validated lead source settings, if both endpoint and sheet id are set
    pub fn source_config(&self) -> Result<Option<SourceConfig>, String> {
        let (Some(endpoint), Some(sheet_id)) = (self.leads_endpoint(), self.sheet_id()) else {
            return Ok(None);
        };
        SourceConfig::new(endpoint, sheet_id)
            .map(|config| Some(config.with_timeout(self.request_timeout())))
            .map_err(|error| error.to_string())
    }

    fn normalize(&mut self) {
        self.phone_number = normalize_text_option(self.phone_number.clone());
        self.display_name = normalize_text_option(self.display_name.clone());
        self.leads_endpoint = normalize_text_option(self.leads_endpoint.clone())
            .map(|endpoint| endpoint.trim_end_matches('/').to_string());
        self.sheet_id = normalize_text_option(self.sheet_id.clone());
    }
}
