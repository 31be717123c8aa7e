//! PHIVOLCS earthquake API client.
//!
//! Provides async HTTP access to the five read-only endpoints.
//! Uses reqwest with rustls for TLS.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::errors::QuakeError;
use crate::filter::FilterCriteria;
use crate::models::{ApiResponse, Earthquake, EarthquakeStats};

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("quakeph/", env!("CARGO_PKG_VERSION"));

/// PHIVOLCS API base URL.
pub const DEFAULT_BASE_URL: &str = "https://phivocs-api.vercel.app";

/// The query shapes the API answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    Earthquakes,
    Top,
    Recent,
    Stats,
    Filter,
}

impl Query {
    /// Short name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Earthquakes => "earthquakes",
            Self::Top => "top",
            Self::Recent => "recent",
            Self::Stats => "stats",
            Self::Filter => "filter",
        }
    }

    /// What the query fetches, for error messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Earthquakes => "earthquakes",
            Self::Top => "top earthquakes",
            Self::Recent => "recent earthquakes",
            Self::Stats => "earthquake stats",
            Self::Filter => "filtered earthquakes",
        }
    }
}

/// Anything that can answer the five earthquake queries.
#[async_trait]
pub trait EarthquakeSource: Send + Sync {
    /// List earthquakes, optionally paged.
    async fn list(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<ApiResponse<Vec<Earthquake>>, QuakeError>;

    /// Strongest `count` earthquakes.
    async fn top(&self, count: usize) -> Result<ApiResponse<Vec<Earthquake>>, QuakeError>;

    /// Most recent `count` earthquakes.
    async fn recent(&self, count: usize) -> Result<ApiResponse<Vec<Earthquake>>, QuakeError>;

    /// Aggregate statistics.
    async fn stats(&self) -> Result<ApiResponse<EarthquakeStats>, QuakeError>;

    /// Earthquakes matching the given criteria.
    async fn filter(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<ApiResponse<Vec<Earthquake>>, QuakeError>;
}

/// Query string for the list endpoint. Absent values are not sent.
#[must_use]
pub fn list_params(limit: Option<usize>, offset: Option<usize>) -> Vec<(&'static str, String)> {
    let mut params = Vec::with_capacity(2);
    if let Some(limit) = limit {
        params.push(("limit", limit.to_string()));
    }
    if let Some(offset) = offset {
        params.push(("offset", offset.to_string()));
    }
    params
}

/// Query string for the filter endpoint. Absent values are not sent.
#[must_use]
pub fn filter_params(criteria: &FilterCriteria) -> Vec<(&'static str, String)> {
    let mut params = Vec::with_capacity(3);
    if let Some(min) = criteria.min_magnitude {
        params.push(("min_magnitude", min.to_string()));
    }
    if let Some(max) = criteria.max_magnitude {
        params.push(("max_magnitude", max.to_string()));
    }
    if let Some(location) = &criteria.location {
        params.push(("location", location.clone()));
    }
    params
}

/// Client for the PHIVOLCS earthquake API.
#[derive(Debug, Clone)]
pub struct PhivolcsClient {
    client: Client,
    base_url: String,
}

impl PhivolcsClient {
    /// Create a client against a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not http(s) or the HTTP client
    /// cannot be initialized.
    pub fn with_base_url(base_url: &str) -> Result<Self, QuakeError> {
        let base_url = base_url.trim_end_matches('/');
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(QuakeError::InvalidResponse(format!(
                "base URL must be http(s), got '{base_url}'"
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// The base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a GET and decode the envelope.
    async fn get<T: DeserializeOwned>(
        &self,
        query: Query,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<ApiResponse<T>, QuakeError> {
        let url = format!("{}{}", self.base_url, path);

        debug!("fetching {} from {}", query.as_str(), url);

        let response = self.client.get(&url).query(params).send().await?;

        // Check status before parsing; error bodies are not inspected
        let status = response.status();
        if !status.is_success() {
            return Err(QuakeError::Api {
                query,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let envelope: ApiResponse<T> = serde_json::from_slice(&body)?;

        debug!("fetched {} ({} records)", query.as_str(), envelope.meta.count);
        Ok(envelope)
    }
}

#[async_trait]
impl EarthquakeSource for PhivolcsClient {
    #[instrument(skip(self))]
    async fn list(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<ApiResponse<Vec<Earthquake>>, QuakeError> {
        self.get(Query::Earthquakes, "/earthquakes", &list_params(limit, offset))
            .await
    }

    #[instrument(skip(self))]
    async fn top(&self, count: usize) -> Result<ApiResponse<Vec<Earthquake>>, QuakeError> {
        self.get(Query::Top, &format!("/earthquakes/top/{count}"), &[])
            .await
    }

    #[instrument(skip(self))]
    async fn recent(&self, count: usize) -> Result<ApiResponse<Vec<Earthquake>>, QuakeError> {
        self.get(Query::Recent, &format!("/earthquakes/recent/{count}"), &[])
            .await
    }

    #[instrument(skip(self))]
    async fn stats(&self) -> Result<ApiResponse<EarthquakeStats>, QuakeError> {
        self.get(Query::Stats, "/earthquakes/stats", &[]).await
    }

    #[instrument(skip(self))]
    async fn filter(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<ApiResponse<Vec<Earthquake>>, QuakeError> {
        self.get(Query::Filter, "/earthquakes/filter", &filter_params(criteria))
            .await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_omit_absent() {
        assert!(list_params(None, None).is_empty());
        assert_eq!(
            list_params(Some(50), None),
            vec![("limit", "50".to_string())]
        );
        assert_eq!(
            list_params(Some(10), Some(20)),
            vec![("limit", "10".to_string()), ("offset", "20".to_string())]
        );
    }

    #[test]
    fn test_filter_params_omit_absent() {
        assert!(filter_params(&FilterCriteria::default()).is_empty());

        let criteria = FilterCriteria {
            min_magnitude: Some(5.0),
            max_magnitude: None,
            location: Some("Batangas".into()),
        };
        assert_eq!(
            filter_params(&criteria),
            vec![
                ("min_magnitude", "5".to_string()),
                ("location", "Batangas".to_string()),
            ]
        );

        let criteria = FilterCriteria {
            min_magnitude: Some(2.5),
            max_magnitude: Some(7.5),
            location: None,
        };
        assert_eq!(
            filter_params(&criteria),
            vec![
                ("min_magnitude", "2.5".to_string()),
                ("max_magnitude", "7.5".to_string()),
            ]
        );
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = PhivolcsClient::with_base_url("https://example.test/").expect("client");
        assert_eq!(client.base_url(), "https://example.test");
        assert!(PhivolcsClient::with_base_url("ftp://example.test").is_err());
    }

    #[test]
    fn test_error_names_query() {
        let err = QuakeError::Api {
            query: Query::Stats,
            status: 500,
        };
        assert_eq!(err.to_string(), "Failed to fetch earthquake stats (HTTP 500)");
    }
}
