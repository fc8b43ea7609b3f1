use super::types::SearchResponse;
use crate::sdk::carpark::{Carpark, SearchParams};
use crate::sdk::search::error::SearchError;
use crate::sdk::search::service::CarparkSource;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

pub const SEARCH_PATH: &str = "/api/carparks/search";

/// Talks to a carpark search endpoint over HTTP.
///
/// No request timeout is set: a slow search is superseded by the next one
/// rather than abandoned.
#[derive(Clone, Debug)]
pub struct RemoteCarparkSource {
    client: Client,
    base_url: String,
}

impl RemoteCarparkSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, params: &SearchParams) -> Result<Response, SearchError> {
        let url = format!("{}{}", self.base_url, SEARCH_PATH);
        log::debug!(
            "[PROVIDER] Calling remote carpark search at {} for {}",
            url,
            params.cache_key()
        );

        let query = [
            ("lat", params.lat.to_string()),
            ("lng", params.lng.to_string()),
            ("duration", params.duration.to_string()),
            ("radius", params.radius.to_string()),
        ];
        self.client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to send carpark search. URL: {}\nError: {}", url, e);
                SearchError::from(e)
            })
    }

    /// Upstream JSON body, untouched. Any non-2xx status is an error.
    pub async fn search_raw(&self, params: &SearchParams) -> Result<Value, SearchError> {
        let response = self.send(params).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }
        Ok(response.json().await?)
    }
}

fn status_error(status: StatusCode) -> SearchError {
    let text = status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string());
    SearchError::Status(text)
}

#[async_trait]
impl CarparkSource for RemoteCarparkSource {
    async fn search(&self, params: &SearchParams) -> Result<Vec<Carpark>, SearchError> {
        let response = self.send(params).await?;
        let status = response.status();

        // No carparks known for the area
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            log::error!("Carpark search returned non-success status: {}", status);
            return Err(status_error(status));
        }

        let text = response.text().await?;
        let body: SearchResponse = serde_json::from_str(&text).map_err(|e| {
            log::error!("Failed to parse carpark search response. Error: {}. Body: {}", e, text);
            e
        })?;
        Ok(body.into_results())
    }
}
