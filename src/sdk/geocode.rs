use super::config::DEFAULT_ONEMAP_BASE_URL;
use super::util::rate_limit::{onemap_limiter, Limiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Shorter queries are not worth a round trip.
pub const MIN_QUERY_CHARS: usize = 3;
pub const MAX_SUGGESTIONS: usize = 5;

const SEARCH_PATH: &str = "/api/common/elastic/search";

#[derive(Error, Debug)]
enum GeocodeError {
    #[error("Underlying request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to parse geocode response: {0}")]
    Parse(#[from] serde_json::Error),
}

// --- OneMap elastic search response ---

#[derive(Deserialize)]
struct OneMapResponse {
    found: u64,
    #[serde(default)]
    results: Vec<OneMapResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct OneMapResult {
    address: String,
    latitude: String,
    longitude: String,
}

impl OneMapResult {
    fn into_suggestion(self) -> Option<AddressSuggestion> {
        let lat = self.latitude.trim().parse().ok()?;
        let lng = self.longitude.trim().parse().ok()?;
        Some(AddressSuggestion {
            address: self.address,
            lat,
            lng,
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AddressSuggestion {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

/// Best-effort address lookup against OneMap. Failures come back as "no match".
pub struct AddressSuggestionClient {
    client: Client,
    base_url: String,
    limiter: Limiter,
}

impl AddressSuggestionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limiter: onemap_limiter(),
        }
    }

    /// Up to five candidates in upstream relevance order. Queries under three
    /// characters return nothing without touching the network.
    pub async fn search_addresses(&self, query: &str) -> Vec<AddressSuggestion> {
        if query.chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }
        match self.fetch(query).await {
            Ok(mut suggestions) => {
                suggestions.truncate(MAX_SUGGESTIONS);
                suggestions
            }
            Err(e) => {
                log::warn!("Address suggestions unavailable for {:?}: {}", query, e);
                Vec::new()
            }
        }
    }

    /// Best match for `query`, if any.
    pub async fn geocode_address(&self, query: &str) -> Option<AddressSuggestion> {
        if query.trim().is_empty() {
            return None;
        }
        match self.fetch(query).await {
            Ok(suggestions) => suggestions.into_iter().next(),
            Err(e) => {
                log::warn!("Failed to geocode {:?}: {}", query, e);
                None
            }
        }
    }

    async fn fetch(&self, query: &str) -> Result<Vec<AddressSuggestion>, GeocodeError> {
        self.limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, SEARCH_PATH);
        log::debug!("[GEOCODE] Searching OneMap for {:?}", query);
        let text = self
            .client
            .get(&url)
            .query(&[
                ("searchVal", query),
                ("returnGeom", "Y"),
                ("getAddrDetails", "Y"),
                ("pageNum", "1"),
            ])
            .send()
            .await?
            .text()
            .await?;

        let body: OneMapResponse = serde_json::from_str(&text)?;
        if body.found == 0 {
            return Ok(Vec::new());
        }

        Ok(body
            .results
            .into_iter()
            .filter_map(|r| {
                let address = r.address.clone();
                let suggestion = r.into_suggestion();
                if suggestion.is_none() {
                    log::debug!("Skipping OneMap result with bad coordinates: {}", address);
                }
                suggestion
            })
            .collect())
    }
}

impl Default for AddressSuggestionClient {
    fn default() -> Self {
        Self::new(DEFAULT_ONEMAP_BASE_URL)
    }
}
