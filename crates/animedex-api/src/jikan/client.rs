use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use animedex_core::config::ApiConfig;
use animedex_core::models::CatalogItem;

use super::types::{JikanErrorBody, JikanListResponse, JikanSingleResponse};
use crate::error::{CatalogError, DEFAULT_API_MESSAGE};
use crate::rate_limit::RateLimiter;
use crate::traits::CatalogSource;

const BASE_URL: &str = "https://api.jikan.moe/v4";

/// Results per list request.
pub const DEFAULT_RESULT_LIMIT: u32 = 20;

/// Jikan asks clients to stay at or below one request per second.
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1000);

/// Jikan v4 (unofficial MyAnimeList) client.
///
/// All requests issued through one client share a single rate-limit gate.
pub struct JikanClient {
    base_url: String,
    http: Client,
    limiter: RateLimiter,
    result_limit: u32,
    sfw: bool,
}

impl Default for JikanClient {
    fn default() -> Self {
        Self::new()
    }
}

impl JikanClient {
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            http: Client::new(),
            limiter: RateLimiter::new(MIN_REQUEST_INTERVAL),
            result_limit: DEFAULT_RESULT_LIMIT,
            sfw: true,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, CatalogError> {
        Ok(Self {
            base_url: validate_base_url(&config.base_url)?,
            http: Client::new(),
            limiter: RateLimiter::new(config.min_request_interval()),
            result_limit: config.result_limit,
            sfw: config.sfw,
        })
    }

    /// Point the client at another server, e.g. a local mirror.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, CatalogError> {
        self.base_url = validate_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.limiter = RateLimiter::new(min_interval);
        self
    }

    fn list_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("limit", self.result_limit.to_string()),
            ("sfw", self.sfw.to_string()),
        ]
    }

    /// Wait for the rate-limit gate, then issue a GET.
    async fn send(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, CatalogError> {
        self.limiter.acquire().await;
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(%url, "Jikan request");
        Ok(self.http.get(&url).query(query).send().await?)
    }

    /// Classify non-2xx responses.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, CatalogError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Jikan rate limit hit");
            return Err(CatalogError::RateLimited);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<JikanErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_API_MESSAGE.to_string());
        tracing::warn!(status = status.as_u16(), %message, "Jikan API error");
        Err(CatalogError::Api {
            status: Some(status.as_u16()),
            message,
        })
    }

    /// Read the body and decode it; malformed payloads are `Unknown`.
    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, CatalogError> {
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| CatalogError::Unknown(e.to_string()))
    }

    async fn get_list(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let resp = Self::check_response(self.send(path, query).await?).await?;
        let list: JikanListResponse = Self::decode(resp).await?;
        Ok(list
            .data
            .into_iter()
            .map(|a| a.into_catalog_item())
            .collect())
    }
}

impl CatalogSource for JikanClient {
    async fn search(&self, query: &str) -> Result<Vec<CatalogItem>, CatalogError> {
        let mut params = vec![("q", query.to_string())];
        params.extend(self.list_params());
        self.get_list("/anime", &params).await
    }

    async fn get_details(&self, id: u64) -> Result<Option<CatalogItem>, CatalogError> {
        let resp = self.send(&format!("/anime/{id}"), &[]).await?;
        // Unknown ids are an absent result, not a failure.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = Self::check_response(resp).await?;
        let single: JikanSingleResponse = Self::decode(resp).await?;
        Ok(Some(single.data.into_catalog_item()))
    }

    async fn get_top(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        self.get_list("/top/anime", &self.list_params()).await
    }
}

/// Parse and strip the trailing slash so paths can be appended.
fn validate_base_url(raw: &str) -> Result<String, CatalogError> {
    let url = Url::parse(raw)
        .map_err(|e| CatalogError::Unknown(format!("invalid base URL {raw:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CatalogError::Unknown(format!(
            "unsupported URL scheme: {}",
            url.scheme()
        )));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}
