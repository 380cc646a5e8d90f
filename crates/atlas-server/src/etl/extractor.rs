//! Country data extractor
//!
//! Fetches the full raw dataset from the configured countries endpoint in a
//! single HTTP GET. Extraction failures abort the pipeline run immediately;
//! there is no retry at this layer.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use super::model::RawCountryRecord;
use crate::config::EtlConfig;

/// Maximum number of response-body bytes carried in error diagnostics
const ERROR_BODY_LIMIT: usize = 1024;

/// Errors raised while extracting from the remote source
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The request could not be completed (DNS, connect, timeout, ...)
    #[error("Request to countries source failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The source answered with a non-2xx status
    #[error("Countries source returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not a JSON array of country records
    #[error("Failed to decode countries payload: {source} (body starts with: {snippet})")]
    Decode {
        #[source]
        source: serde_json::Error,
        snippet: String,
    },
}

/// Extracts raw country records from the external data source
pub struct CountryExtractor {
    client: Client,
    source_url: String,
}

impl CountryExtractor {
    /// Create a new extractor for the configured source endpoint
    pub fn new(config: &EtlConfig) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.source_request_timeout_secs))
            .user_agent("atlas-etl/0.1")
            .build()?;

        Ok(Self {
            client,
            source_url: config.source_url.clone(),
        })
    }

    /// Fetch the full raw dataset
    ///
    /// Performs exactly one outbound request. Non-2xx statuses and malformed
    /// bodies are surfaced with enough detail for diagnostics (status code,
    /// truncated body) without being retried here.
    #[tracing::instrument(skip(self), fields(url = %self.source_url))]
    pub async fn extract(&self) -> Result<Vec<RawCountryRecord>, ExtractionError> {
        info!("Extracting country data");

        let response = self.client.get(&self.source_url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_LIMIT),
            });
        }

        let body = response.text().await?;
        let records: Vec<RawCountryRecord> =
            serde_json::from_str(&body).map_err(|source| ExtractionError::Decode {
                source,
                snippet: truncate(&body, 256),
            })?;

        info!(count = records.len(), "Extraction completed");

        Ok(records)
    }
}

fn truncate(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        s.to_string()
    } else {
        let mut end = limit;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("hello world", 5), "hello...");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "ααααα";
        let out = truncate(s, 3);
        assert!(out.starts_with('α'));
    }
}
