use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::{SocCode, SortKey},
    error::ApiErrorBody,
    protocol::{HealthStatus, ListingPage, OccupationDetail, RankingPage},
};
use tracing::debug;
use url::Url;

pub mod cancel;
pub mod config;
pub mod controller;
pub mod error;

pub use cancel::CancelToken;
pub use config::{load_settings, resolve_data_version, ClientSettings};
pub use error::{ClientError, Resource};

const OCCUPATIONS_PATH: &str = "occupations";
const RANKINGS_PATH: [&str; 2] = ["rankings", "ai_risk"];
const HEALTH_PATH: &str = "health";

/// Inputs of `GET /occupations`. Absent, empty or zero values are left out of the query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub sort: Option<SortKey>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub data_version: Option<String>,
}

#[async_trait]
pub trait OccupationApi: Send + Sync {
    async fn list_occupations(
        &self,
        query: &ListingQuery,
        cancel: &CancelToken,
    ) -> Result<ListingPage, ClientError>;

    async fn occupation_detail(
        &self,
        soc_code: &SocCode,
        data_version: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<OccupationDetail, ClientError>;

    async fn rankings(
        &self,
        limit: Option<u32>,
        data_version: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<RankingPage, ClientError>;
}

/// HTTP client for the occupation risk API. No retries, no caching.
#[derive(Debug, Clone)]
pub struct RiskApiClient {
    http: Client,
    base: Url,
    default_data_version: String,
}

impl RiskApiClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let raw_base = config::normalize_api_base(&settings.api_base);
        let base =
            Url::parse(&raw_base).map_err(|_| ClientError::InvalidBaseUrl(raw_base.clone()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(raw_base));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ClientError::Build)?;

        Ok(Self {
            http,
            base,
            default_data_version: settings.default_data_version.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn resolve_data_version(&self, requested: Option<&str>) -> String {
        resolve_data_version(requested, &self.default_data_version)
    }

    pub fn listing_url(&self, query: &ListingQuery) -> Result<Url, ClientError> {
        let mut url = self.endpoint(&[OCCUPATIONS_PATH])?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(search) = query.search.as_deref().map(str::trim) {
                if !search.is_empty() {
                    pairs.append_pair("search", search);
                }
            }
            if let Some(sort) = query.sort {
                pairs.append_pair("sort", sort.as_query_value());
            }
            if let Some(page) = query.page.filter(|page| *page > 0) {
                pairs.append_pair("page", &page.to_string());
            }
            if let Some(page_size) = query.page_size.filter(|size| *size > 0) {
                pairs.append_pair("page_size", &page_size.to_string());
            }
            pairs.append_pair(
                "data_version",
                &self.resolve_data_version(query.data_version.as_deref()),
            );
        }
        Ok(url)
    }

    pub fn detail_url(
        &self,
        soc_code: &SocCode,
        data_version: Option<&str>,
    ) -> Result<Url, ClientError> {
        if soc_code.as_str().trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "occupation code must not be empty".to_string(),
            ));
        }
        let mut url = self.endpoint(&[OCCUPATIONS_PATH, soc_code.as_str()])?;
        url.query_pairs_mut()
            .append_pair("data_version", &self.resolve_data_version(data_version));
        Ok(url)
    }

    pub fn rankings_url(
        &self,
        limit: Option<u32>,
        data_version: Option<&str>,
    ) -> Result<Url, ClientError> {
        let mut url = self.endpoint(&RANKINGS_PATH)?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(limit) = limit.filter(|limit| *limit > 0) {
                pairs.append_pair("limit", &limit.to_string());
            }
            pairs.append_pair("data_version", &self.resolve_data_version(data_version));
        }
        Ok(url)
    }

    pub async fn health(&self, cancel: &CancelToken) -> Result<String, ClientError> {
        let url = self.endpoint(&[HEALTH_PATH])?;
        let body: HealthStatus = self.get_json(Resource::Health, url, cancel).await?;
        Ok(body.status)
    }

    /// Appends percent-encoded path segments to the base URL, keeping any base path prefix.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidBaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: Resource,
        url: Url,
        cancel: &CancelToken,
    ) -> Result<T, ClientError> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        debug!(%resource, %url, "issuing request");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%resource, "request cancelled");
                Err(ClientError::Cancelled)
            }
            result = self.fetch_json(resource, url) => result,
        }
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        resource: Resource,
        url: Url,
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ClientError::Transport { resource, source })?;

        let status = response.status();
        if !status.is_success() {
            // The failure body is informational only and never decoded as a success value.
            let detail = response
                .bytes()
                .await
                .ok()
                .and_then(|body| serde_json::from_slice::<ApiErrorBody>(&body).ok())
                .and_then(|body| body.message());
            return Err(ClientError::Status {
                resource,
                status,
                detail,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport { resource, source })?;
        serde_json::from_slice(&body).map_err(|source| ClientError::Decode { resource, source })
    }
}

#[async_trait]
impl OccupationApi for RiskApiClient {
    async fn list_occupations(
        &self,
        query: &ListingQuery,
        cancel: &CancelToken,
    ) -> Result<ListingPage, ClientError> {
        let url = self.listing_url(query)?;
        self.get_json(Resource::Occupations, url, cancel).await
    }

    async fn occupation_detail(
        &self,
        soc_code: &SocCode,
        data_version: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<OccupationDetail, ClientError> {
        let url = self.detail_url(soc_code, data_version)?;
        self.get_json(Resource::Occupation, url, cancel).await
    }

    async fn rankings(
        &self,
        limit: Option<u32>,
        data_version: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<RankingPage, ClientError> {
        let url = self.rankings_url(limit, data_version)?;
        self.get_json(Resource::Rankings, url, cancel).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
