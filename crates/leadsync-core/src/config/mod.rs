//! Lead source configuration.
//!
//! Validated once at construction so the HTTP adapter never has to deal with
//! half-configured endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Default HTTP timeout for one lead fetch
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where and how to fetch an account's leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Lead listing endpoint, without query string
    pub endpoint: String,
    /// Spreadsheet identifier passed as `sheetId`
    pub sheet_id: String,
    /// Client-side timeout for the whole request
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

const fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
}

impl SourceConfig {
    /// Validate and normalize a source configuration.
    ///
    /// The endpoint must use http(s); a trailing slash is dropped.
    pub fn new(endpoint: impl Into<String>, sheet_id: impl Into<String>) -> Result<Self> {
        let endpoint = normalize_text_option(Some(endpoint.into()))
            .ok_or_else(|| Error::InvalidInput("leads endpoint is required".into()))?;
        if !is_http_url(&endpoint) {
            return Err(Error::InvalidInput(
                "leads endpoint must include http:// or https://".into(),
            ));
        }
        let sheet_id = normalize_text_option(Some(sheet_id.into()))
            .ok_or_else(|| Error::InvalidInput("sheet id is required".into()))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            sheet_id,
            timeout: default_timeout(),
        })
    }

    /// Override the request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_config_trims_trailing_slash() {
        let config = SourceConfig::new(" https://leads.example.com/fetch/ ", "sheet-1").unwrap();
        assert_eq!(config.endpoint, "https://leads.example.com/fetch");
        assert_eq!(config.sheet_id, "sheet-1");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn source_config_rejects_invalid_values() {
        assert!(SourceConfig::new("", "sheet").is_err());
        assert!(SourceConfig::new("leads.example.com", "sheet").is_err());
        assert!(SourceConfig::new("https://leads.example.com", "  ").is_err());
    }

    #[test]
    fn with_timeout_overrides_default() {
        let config = SourceConfig::new("https://leads.example.com", "s")
            .unwrap()
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
