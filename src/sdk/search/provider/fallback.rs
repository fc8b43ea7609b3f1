use super::mock::MockCarparkSource;
use super::remote::RemoteCarparkSource;
use super::types::{SearchResponse, SearchResults};
use crate::sdk::carpark::{Carpark, SearchParams};
use crate::sdk::config::BackendConfig;
use crate::sdk::search::error::SearchError;
use crate::sdk::search::service::CarparkSource;
use async_trait::async_trait;
use serde_json::Value;

/// Prefers the real backend when one is configured and answers; otherwise
/// serves mock data. Never fails.
#[derive(Clone, Debug)]
pub struct FallbackCarparkSource {
    backend: Option<RemoteCarparkSource>,
    mock: MockCarparkSource,
}

impl FallbackCarparkSource {
    pub fn new(backend: Option<RemoteCarparkSource>, mock: MockCarparkSource) -> Self {
        Self { backend, mock }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        let backend = match config {
            BackendConfig::Remote { base_url } => Some(RemoteCarparkSource::new(base_url.clone())),
            BackendConfig::Mock => None,
        };
        Self::new(backend, MockCarparkSource::default())
    }

    pub fn is_mock_only(&self) -> bool {
        self.backend.is_none()
    }

    /// Response body for the search endpoint: the backend's JSON verbatim,
    /// or `{"results": [...]}` from the mock.
    pub async fn search_json(&self, params: &SearchParams) -> Result<Value, SearchError> {
        if let Some(backend) = &self.backend {
            log::debug!("[Fallback Provider] Using BACKEND for search_json");
            match backend.search_raw(params).await {
                Ok(body) => return Ok(body),
                Err(e) => log::warn!("Backend API error, falling back to mock: {}", e),
            }
        }

        let results = self.mock.search(params).await?;
        Ok(serde_json::to_value(SearchResults { results: &results })?)
    }
}

#[async_trait]
impl CarparkSource for FallbackCarparkSource {
    async fn search(&self, params: &SearchParams) -> Result<Vec<Carpark>, SearchError> {
        if let Some(backend) = &self.backend {
            log::debug!("[Fallback Provider] Using BACKEND for search");
            // Any non-2xx, 404 included, means the backend could not answer
            let parsed = backend.search_raw(params).await.and_then(|body| {
                serde_json::from_value::<SearchResponse>(body).map_err(SearchError::from)
            });
            match parsed {
                Ok(body) => return Ok(body.into_results()),
                Err(e) => log::warn!("Backend API error, falling back to mock: {}", e),
            }
        }

        log::debug!("[Fallback Provider] Using MOCK for search");
        self.mock.search(params).await
    }
}
