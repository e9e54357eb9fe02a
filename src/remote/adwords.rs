//! Reporting API client
//!
//! Downloads AWQL reports as CSV:
//!
//! ```text
//! POST <endpoint><api_version>
//! clientCustomerId: 123-456-7890
//! developerToken: ...
//! Authorization: Bearer ...
//!
//! __rdquery=SELECT ...&__fmt=CSV
//! ```
//!
//! A rejected query comes back as HTTP 400 with an XML body:
//!
//! ```xml
//! <reportDownloadError>
//!   <ApiError>
//!     <type>ReportDefinitionError.CUSTOMER_SERVING_TYPE_REPORT_MISMATCH</type>
//!     <trigger></trigger>
//!     <fieldPath>selector</fieldPath>
//!   </ApiError>
//! </reportDownloadError>
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::error::{FetchError, FetchResult};
use super::ReportSource;
use crate::config::AdwordsConfig;

const REPORT_FORMAT: &str = "CSV";

/// HTTP client for the report download service
pub struct AdwordsClient {
    client: Client,
    config: AdwordsConfig,
}

#[derive(Debug, Deserialize)]
struct ReportDownloadError {
    #[serde(rename = "ApiError")]
    api_error: ApiError,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    trigger: String,
    #[serde(rename = "fieldPath", default)]
    field_path: String,
}

impl AdwordsClient {
    pub fn new(config: AdwordsConfig) -> FetchResult<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AdwordsConfig {
        &self.config
    }

    fn url(&self) -> String {
        format!("{}{}", self.config.endpoint, self.config.api_version)
    }

    fn check_credentials(&self) -> FetchResult<()> {
        if self.config.account_id.is_empty() {
            return Err(FetchError::MissingCredentials("account id"));
        }
        if self.config.developer_token.is_empty() {
            return Err(FetchError::MissingCredentials("developer token"));
        }
        Ok(())
    }
}

#[async_trait]
impl ReportSource for AdwordsClient {
    async fn fetch(&self, query: &str) -> FetchResult<Vec<Vec<String>>> {
        self.check_credentials()?;
        tracing::info!(account = %self.config.account_id, query = %query, "Downloading report");

        let mut request = self
            .client
            .post(self.url())
            .header("Accept", "*/*")
            .header("clientCustomerId", &self.config.account_id)
            .header("developerToken", &self.config.developer_token)
            .header(
                "includeZeroImpressions",
                self.config.zero_impressions.to_string(),
            )
            .header("skipColumnHeader", "true")
            .header("skipReportHeader", "true")
            .header("skipReportSummary", "true")
            .header("useRawEnumValues", "false")
            .form(&[("__rdquery", query), ("__fmt", REPORT_FORMAT)]);
        if !self.config.access_token.is_empty() {
            request = request.bearer_auth(&self.config.access_token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        match status {
            StatusCode::OK => {
                let rows = parse_report(&body)?;
                tracing::debug!(rows = rows.len(), "Downloaded report");
                Ok(rows)
            }
            StatusCode::BAD_REQUEST => Err(parse_api_error(&body)),
            other => Err(FetchError::ServiceUnavailable(other.as_u16())),
        }
    }
}

/// Read a header-less CSV report body
fn parse_report(body: &str) -> FetchResult<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Turn a report download error document into a [`FetchError`]
fn parse_api_error(body: &str) -> FetchError {
    if body.trim().is_empty() {
        return FetchError::ServiceUnavailable(StatusCode::BAD_REQUEST.as_u16());
    }
    let error = match quick_xml::de::from_str::<ReportDownloadError>(body) {
        Ok(doc) => doc.api_error,
        Err(e) => ApiError {
            kind: e.to_string(),
            ..Default::default()
        },
    };
    FetchError::Api {
        kind: error.kind,
        trigger: error.trigger,
        field: Some(error.field_path).filter(|f| !f.is_empty()),
    }
}
