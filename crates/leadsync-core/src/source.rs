//! Remote lead source: the spreadsheet-backed HTTP endpoint.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::models::{AccountScope, Lead};
use crate::util::compact_text;

/// Fetches the complete current lead list for an account.
///
/// One call per sync cycle. Implementations must not retry and must not
/// have side effects; every failure is `Error::SourceUnavailable`.
#[async_trait]
pub trait LeadSource: Send + Sync {
    async fn fetch_leads(&self, scope: &AccountScope) -> Result<Vec<Lead>>;
}

/// Body returned by the lead endpoint
#[derive(Debug, Deserialize)]
struct LeadsResponse {
    #[serde(default)]
    leads: Vec<Lead>,
}

#[derive(Debug, Deserialize)]
struct SourceErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// `LeadSource` over `GET {endpoint}?sheetId=..&sheetName=..`
#[derive(Clone)]
pub struct SheetLeadSource {
    config: SourceConfig,
    client: reqwest::Client,
}

impl SheetLeadSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| {
                Error::InvalidInput(format!("failed to build lead source HTTP client: {error}"))
            })?;
        Ok(Self { config, client })
    }

    /// Request URL for one account; the sheet name is the scope's last ten digits.
    pub fn request_url(&self, scope: &AccountScope) -> Result<Url> {
        Url::parse_with_params(
            &self.config.endpoint,
            &[
                ("sheetId", self.config.sheet_id.as_str()),
                ("sheetName", scope.sheet_name()),
            ],
        )
        .map_err(|error| Error::InvalidInput(format!("invalid leads endpoint: {error}")))
    }
}

#[async_trait]
impl LeadSource for SheetLeadSource {
    async fn fetch_leads(&self, scope: &AccountScope) -> Result<Vec<Lead>> {
        let url = self.request_url(scope)?;
        tracing::debug!("Fetching leads for sheet {}", scope.sheet_name());

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::SourceUnavailable {
                status: Some(status.as_u16()),
                message: parse_api_error(status, &body),
            });
        }

        let leads = parse_leads_payload(&body)?;
        tracing::debug!("Lead source returned {} leads", leads.len());
        Ok(leads)
    }
}

/// Parse `{ "leads": [...] }`; a malformed body counts as the source failing.
pub fn parse_leads_payload(body: &str) -> Result<Vec<Lead>> {
    serde_json::from_str::<LeadsResponse>(body)
        .map(|payload| payload.leads)
        .map_err(|error| Error::source_unavailable(format!("invalid leads payload: {error}")))
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<SourceErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", compact_text(&message), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SheetLeadSource {
        SheetLeadSource::new(
            SourceConfig::new("https://leads.example.com/fetch-client-leads", "sheet-123").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn request_url_uses_last_ten_digits() {
        let scope = AccountScope::from_phone("+91 98765 43210").unwrap();
        let url = source().request_url(&scope).unwrap();
        assert_eq!(
            url.as_str(),
            "https://leads.example.com/fetch-client-leads?sheetId=sheet-123&sheetName=9876543210"
        );
    }

    #[test]
    fn parse_payload_reads_leads() {
        let body = r#"{"leads":[
            {"name":"A","whatsapp_number_":"+911234567890","created_time":"2024-01-01T10:00:00Z","lead_status":"New Lead"},
            {"name":"B","whatsapp_number_":"+911234567891","created_time":"2024-01-02T10:00:00Z","city":"Pune"}
        ]}"#;
        let leads = parse_leads_payload(body).unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[1].extra_text("city").as_deref(), Some("Pune"));
    }

    #[test]
    fn parse_payload_without_leads_is_empty() {
        assert!(parse_leads_payload("{}").unwrap().is_empty());
    }

    #[test]
    fn parse_payload_rejects_garbage_as_source_error() {
        let error = parse_leads_payload("<html>oops</html>").unwrap_err();
        assert!(matches!(error, Error::SourceUnavailable { status: None, .. }));
    }

    #[test]
    fn parse_api_error_prefers_message_field() {
        assert_eq!(
            parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"sheet missing"}"#),
            "sheet missing (500)"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, "  "), "HTTP 502");
    }
}
