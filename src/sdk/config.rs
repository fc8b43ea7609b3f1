use std::{env, path::PathBuf, time::Duration};
use thiserror::Error;

use super::navigation::DEFAULT_APP_FALLBACK;

pub const DEFAULT_PUBLIC_API_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_ONEMAP_BASE_URL: &str = "https://www.onemap.gov.sg";
pub const DEFAULT_CACHE_FILE: &str = "search_cache.json";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{set} is set but {missing} is not")]
    IncompletePosition {
        set: &'static str,
        missing: &'static str,
    },
}

/// Where carpark availability comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendConfig {
    Remote { base_url: String },
    Mock,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub backend: BackendConfig,
    /// Base of the search endpoint the client side talks to.
    pub public_api_url: String,
    pub onemap_base_url: String,
    pub cache_file: PathBuf,
    pub bind_addr: String,
    pub app_fallback: Duration,
    /// Fixed device position; `None` means no location capability.
    pub device_position: Option<(f64, f64)>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let backend = match var("BACKEND_API_URL") {
            Some(base_url) => BackendConfig::Remote { base_url },
            None => BackendConfig::Mock,
        };

        let app_fallback = match var("CARPARK_APP_FALLBACK_MS") {
            Some(raw) => Duration::from_millis(parse_number("CARPARK_APP_FALLBACK_MS", &raw)?),
            None => DEFAULT_APP_FALLBACK,
        };

        let device_lat = var("CARPARK_DEVICE_LAT")
            .map(|raw| parse_number::<f64>("CARPARK_DEVICE_LAT", &raw))
            .transpose()?;
        let device_lng = var("CARPARK_DEVICE_LNG")
            .map(|raw| parse_number::<f64>("CARPARK_DEVICE_LNG", &raw))
            .transpose()?;
        let device_position = match (device_lat, device_lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::IncompletePosition {
                    set: "CARPARK_DEVICE_LAT",
                    missing: "CARPARK_DEVICE_LNG",
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::IncompletePosition {
                    set: "CARPARK_DEVICE_LNG",
                    missing: "CARPARK_DEVICE_LAT",
                })
            }
        };

        Ok(Self {
            backend,
            public_api_url: var("PUBLIC_API_URL").unwrap_or_else(|| DEFAULT_PUBLIC_API_URL.to_string()),
            onemap_base_url: var("ONEMAP_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ONEMAP_BASE_URL.to_string()),
            cache_file: var("CARPARK_CACHE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE)),
            bind_addr: var("CARPARK_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            app_fallback,
            device_position,
        })
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        name,
        value: raw.to_string(),
    })
}
