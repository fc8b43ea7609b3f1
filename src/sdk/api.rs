use super::carpark::{SearchParams, DEFAULT_DURATION_HOURS, DEFAULT_RADIUS_M};
use super::search::provider::remote::SEARCH_PATH;
use super::search::{FallbackCarparkSource, SearchError};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

pub const HEALTH_PATH: &str = "/health";

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<FallbackCarparkSource>,
}

impl AppState {
    pub fn new(source: FallbackCarparkSource) -> Self {
        Self {
            source: Arc::new(source),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (code, body).into_response()
    }
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::MissingCoordinates | SearchError::InvalidParameter { .. } => {
                ApiError::BadRequest(e.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(SEARCH_PATH, get(search_carparks))
        .with_state(state)
}

/// Serves the API on `addr` until the process stops.
pub async fn serve(addr: &str, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Carpark search API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Query values arrive as text so that absence and bad numbers can be told apart.
#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    lat: Option<String>,
    lng: Option<String>,
    duration: Option<String>,
    radius: Option<String>,
}

impl SearchQuery {
    fn into_params(self) -> Result<SearchParams, SearchError> {
        let (Some(lat), Some(lng)) = (non_empty(self.lat), non_empty(self.lng)) else {
            return Err(SearchError::MissingCoordinates);
        };
        SearchParams::new(
            parse_param("lat", &lat)?,
            parse_param("lng", &lng)?,
            non_empty(self.duration)
                .map(|raw| parse_param("duration", &raw))
                .transpose()?
                .unwrap_or(DEFAULT_DURATION_HOURS),
            non_empty(self.radius)
                .map(|raw| parse_param("radius", &raw))
                .transpose()?
                .unwrap_or(DEFAULT_RADIUS_M),
        )
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_param(name: &'static str, raw: &str) -> Result<f64, SearchError> {
    raw.trim()
        .parse()
        .map_err(|_| SearchError::InvalidParameter {
            name,
            value: raw.to_string(),
        })
}

async fn search_carparks(
    State(st): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let params = query.into_params()?;
    log::debug!("[API] Carpark search {}", params.cache_key());
    let body = st.source.search_json(&params).await?;
    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(lat: Option<&str>, lng: Option<&str>) -> SearchQuery {
        SearchQuery {
            lat: lat.map(str::to_string),
            lng: lng.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_duration_and_radius() {
        let params = query(Some("1.3006"), Some("103.8393")).into_params().unwrap();
        assert_eq!(params.duration, 3.0);
        assert_eq!(params.radius, 1000.0);
    }

    #[test]
    fn missing_or_blank_coordinates() {
        assert!(matches!(
            query(None, Some("103.8")).into_params(),
            Err(SearchError::MissingCoordinates)
        ));
        assert!(matches!(
            query(Some(""), Some("103.8")).into_params(),
            Err(SearchError::MissingCoordinates)
        ));
    }

    #[test]
    fn non_numeric_values_are_bad_requests() {
        let err = SearchQuery {
            duration: Some("three".to_string()),
            ..query(Some("1.3"), Some("103.8"))
        }
        .into_params()
        .unwrap_err();
        assert!(matches!(ApiError::from(err), ApiError::BadRequest(_)));
    }
}
