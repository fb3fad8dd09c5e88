//! Wire layer for report uploads
//!
//! One fire-and-forget POST per eligible slot. Only the response status line
//! matters; bodies are never read and transport failures are reported as the
//! absence of a status rather than as errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Serialize;

use crate::config::ReporterConfig;
use crate::error::{Error, Result};

/// Marker header identifying operational-profile reports to the endpoint.
pub const OPERATIONAL_PROFILE_HEADER: &str = "X-Brave-FL-Operational-Profile";

/// Value of the marker header (structured-header boolean true).
pub const OPERATIONAL_PROFILE_HEADER_VALUE: &str = "?1";

/// Report payload.
///
/// Field order is the wire order; the endpoint expects exactly these three
/// keys and no others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub collection_id: String,
    pub platform: String,
    pub collection_slot: i64,
}

/// Transport seam for report uploads.
///
/// Returns `Some(status)` when a response status line arrived, `None` on
/// transport failure (connection refused, timeout, TLS error). There is no
/// error variant: every non-200 outcome is treated the same by the caller.
#[async_trait]
pub trait ReportTransport: Send + Sync {
    async fn post_report(&self, report: &CollectionReport) -> Option<u16>;
}

/// reqwest-backed transport posting to the collection endpoint.
///
/// The client is built without a cookie store, so requests never carry
/// credentials.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(config: &ReporterConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            OPERATIONAL_PROFILE_HEADER,
            HeaderValue::from_static(OPERATIONAL_PROFILE_HEADER_VALUE),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl ReportTransport for HttpTransport {
    async fn post_report(&self, report: &CollectionReport) -> Option<u16> {
        match self
            .client
            .post(&self.endpoint)
            .json(report)
            .send()
            .await
        {
            Ok(response) => Some(response.status().as_u16()),
            Err(e) => {
                tracing::debug!(error = %e, "Report upload produced no response");
                None
            }
        }
    }
}
