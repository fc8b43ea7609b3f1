use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::search::error::SearchError;

/// Radius used when the caller does not pick one, in meters.
pub const DEFAULT_RADIUS_M: f64 = 1000.0;
/// Parking duration used when the caller does not pick one, in hours.
pub const DEFAULT_DURATION_HOURS: f64 = 3.0;
/// Durations offered to the user, in hours.
pub const DURATION_PRESETS: [f64; 7] = [0.5, 1.0, 2.0, 3.0, 4.0, 6.0, 12.0];

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CarparkType {
    #[serde(rename = "HDB")]
    Hdb,
    #[serde(rename = "LTA")]
    Lta,
    #[serde(rename = "URA")]
    Ura,
    Private,
}

impl fmt::Display for CarparkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CarparkType::Hdb => "HDB",
            CarparkType::Lta => "LTA",
            CarparkType::Ura => "URA",
            CarparkType::Private => "Private",
        };
        f.write_str(label)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Carpark {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CarparkType,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_m: f64,
    pub walk_time_min: u32,
    pub total_cost: f64,
    pub rate_per_hour: f64,
    pub available_lots: u32,
    pub total_lots: u32,
    pub updated_at: DateTime<Utc>,
}

/// Coarse lot availability, used to colour results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    High,
    Limited,
    Low,
    Unknown,
}

impl Carpark {
    pub fn availability(&self) -> Availability {
        if self.total_lots == 0 {
            return Availability::Unknown;
        }
        let ratio = f64::from(self.available_lots) / f64::from(self.total_lots);
        if ratio > 0.3 {
            Availability::High
        } else if ratio > 0.1 {
            Availability::Limited
        } else {
            Availability::Low
        }
    }

    pub fn is_full(&self) -> bool {
        self.available_lots == 0
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SearchParams {
    pub lat: f64,
    pub lng: f64,
    pub duration: f64,
    pub radius: f64,
}

impl SearchParams {
    /// Builds validated parameters: finite coordinates, positive duration and radius.
    pub fn new(lat: f64, lng: f64, duration: f64, radius: f64) -> Result<Self, SearchError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(SearchError::MissingCoordinates);
        }
        if !(duration.is_finite() && duration > 0.0) {
            return Err(SearchError::InvalidParameter {
                name: "duration",
                value: duration.to_string(),
            });
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SearchError::InvalidParameter {
                name: "radius",
                value: radius.to_string(),
            });
        }
        Ok(Self {
            lat,
            lng,
            duration,
            radius,
        })
    }

    /// Cache key: the four numbers joined verbatim, no rounding.
    pub fn cache_key(&self) -> String {
        format!("{},{},{},{}", self.lat, self.lng, self.duration, self.radius)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    Idle,
    Loading,
    Success,
    Error,
    Empty,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SearchState {
    pub status: SearchStatus,
    pub results: Vec<Carpark>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchState {
    pub fn idle() -> Self {
        Self {
            status: SearchStatus::Idle,
            results: Vec::new(),
            error: None,
        }
    }

    pub fn loading() -> Self {
        Self {
            status: SearchStatus::Loading,
            ..Self::idle()
        }
    }

    /// `success` for a non-empty list, `empty` otherwise.
    pub fn from_results(results: Vec<Carpark>) -> Self {
        let status = if results.is_empty() {
            SearchStatus::Empty
        } else {
            SearchStatus::Success
        };
        Self {
            status,
            results,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: SearchStatus::Error,
            results: Vec::new(),
            error: Some(message.into()),
        }
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::idle()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocationStatus {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LocationState {
    pub status: LocationStatus,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: Option<String>,
    pub error: Option<String>,
}

impl LocationState {
    pub fn idle() -> Self {
        Self {
            status: LocationStatus::Idle,
            lat: None,
            lng: None,
            address: None,
            error: None,
        }
    }

    pub fn loading() -> Self {
        Self {
            status: LocationStatus::Loading,
            ..Self::idle()
        }
    }

    pub fn located(lat: f64, lng: f64, address: impl Into<String>) -> Self {
        Self {
            status: LocationStatus::Success,
            lat: Some(lat),
            lng: Some(lng),
            address: Some(address.into()),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: LocationStatus::Error,
            error: Some(message.into()),
            ..Self::idle()
        }
    }

    /// Coordinates, only once the location has resolved.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.status, self.lat, self.lng) {
            (LocationStatus::Success, Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

impl Default for LocationState {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lots(available: u32, total: u32) -> Carpark {
        Carpark {
            id: "HDB-T1".to_string(),
            name: "Test".to_string(),
            kind: CarparkType::Hdb,
            address: "1 Test Rd".to_string(),
            latitude: 1.3,
            longitude: 103.8,
            distance_m: 100.0,
            walk_time_min: 1,
            total_cost: 0.0,
            rate_per_hour: 1.0,
            available_lots: available,
            total_lots: total,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn availability_thresholds() {
        assert_eq!(lots(45, 100).availability(), Availability::High);
        assert_eq!(lots(30, 100).availability(), Availability::Limited);
        assert_eq!(lots(10, 100).availability(), Availability::Low);
        assert_eq!(lots(0, 0).availability(), Availability::Unknown);
        assert!(lots(0, 90).is_full());
    }

    #[test]
    fn carpark_type_uses_wire_labels() {
        let json = serde_json::to_string(&CarparkType::Hdb).unwrap();
        assert_eq!(json, "\"HDB\"");
        let parsed: CarparkType = serde_json::from_str("\"Private\"").unwrap();
        assert_eq!(parsed, CarparkType::Private);
    }

    #[test]
    fn carpark_serializes_kind_as_type() {
        let value = serde_json::to_value(lots(1, 2)).unwrap();
        assert_eq!(value["type"], "HDB");
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn cache_key_is_verbatim() {
        let params = SearchParams::new(1.3006, 103.8393, 3.0, 1000.0).unwrap();
        assert_eq!(params.cache_key(), "1.3006,103.8393,3,1000");

        let half_hour = SearchParams::new(1.3, 103.8, 0.5, 1000.0).unwrap();
        assert_eq!(half_hour.cache_key(), "1.3,103.8,0.5,1000");
    }

    #[test]
    fn params_reject_non_positive_duration_and_radius() {
        assert!(matches!(
            SearchParams::new(1.3, 103.8, 0.0, 1000.0),
            Err(SearchError::InvalidParameter { name: "duration", .. })
        ));
        assert!(matches!(
            SearchParams::new(1.3, 103.8, 3.0, -5.0),
            Err(SearchError::InvalidParameter { name: "radius", .. })
        ));
        assert!(matches!(
            SearchParams::new(f64::NAN, 103.8, 3.0, 1000.0),
            Err(SearchError::MissingCoordinates)
        ));
    }

    #[test]
    fn search_state_from_results() {
        assert_eq!(SearchState::from_results(Vec::new()).status, SearchStatus::Empty);
        assert_eq!(
            SearchState::from_results(vec![lots(1, 1)]).status,
            SearchStatus::Success
        );
    }

    #[test]
    fn location_coordinates_require_success() {
        assert_eq!(LocationState::idle().coordinates(), None);
        assert_eq!(LocationState::failed("nope").coordinates(), None);
        assert_eq!(
            LocationState::located(1.3, 103.8, "Current Location").coordinates(),
            Some((1.3, 103.8))
        );
    }
}
