use super::carpark::LocationState;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

/// Address shown for a position that came from the device.
pub const CURRENT_LOCATION: &str = "Current Location";
pub const UNSUPPORTED_MESSAGE: &str = "Geolocation is not supported by your browser.";

#[derive(Clone, Debug, PartialEq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest position that may be reused instead of asking again.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum PositionError {
    #[error("Location access denied. Please enable in your browser settings.")]
    PermissionDenied,

    #[error("Location information unavailable.")]
    PositionUnavailable,

    #[error("Location request timed out. Please try again.")]
    Timeout,

    #[error("Unable to get your location.")]
    Unknown,
}

/// A platform position API.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self, options: &PositionOptions) -> Result<Position, PositionError>;
}

/// Reports the same position every time, e.g. one taken from configuration.
pub struct FixedPositionSource {
    position: Position,
}

impl FixedPositionSource {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Position {
                latitude,
                longitude,
            },
        }
    }
}

#[async_trait]
impl PositionSource for FixedPositionSource {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Position, PositionError> {
        Ok(self.position)
    }
}

/// Tracks where the user wants to park.
///
/// The location comes either from a [`PositionSource`] or from an address the
/// user picked. Nothing retries on its own.
pub struct GeolocationProvider {
    source: Option<Arc<dyn PositionSource>>,
    options: PositionOptions,
    last_fix: Mutex<Option<(Position, Instant)>>,
    state: watch::Sender<LocationState>,
}

impl GeolocationProvider {
    pub fn new(source: Option<Arc<dyn PositionSource>>) -> Self {
        Self::with_options(source, PositionOptions::default())
    }

    pub fn with_options(source: Option<Arc<dyn PositionSource>>, options: PositionOptions) -> Self {
        let (state, _) = watch::channel(LocationState::idle());
        Self {
            source,
            options,
            last_fix: Mutex::new(None),
            state,
        }
    }

    /// A provider for a host with no location capability at all.
    pub fn unsupported() -> Self {
        Self::new(None)
    }

    pub fn state(&self) -> LocationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LocationState> {
        self.state.subscribe()
    }

    pub fn can_search(&self) -> bool {
        self.state.borrow().coordinates().is_some()
    }

    pub async fn get_current_location(&self) -> LocationState {
        let Some(source) = self.source.clone() else {
            return self.publish(LocationState::failed(UNSUPPORTED_MESSAGE));
        };

        self.publish(LocationState::loading());

        if let Some(position) = self.recent_fix() {
            log::debug!("Reusing position from the last {:?}", self.options.maximum_age);
            return self.publish(located(position));
        }

        let outcome = tokio::time::timeout(self.options.timeout, source.current_position(&self.options))
            .await
            .unwrap_or(Err(PositionError::Timeout));

        match outcome {
            Ok(position) => {
                *self.lock_fix() = Some((position, Instant::now()));
                self.publish(located(position))
            }
            Err(e) => {
                log::warn!("Geolocation failed: {}", e);
                self.publish(LocationState::failed(e.to_string()))
            }
        }
    }

    /// Records an address the user picked.
    pub fn set_location(&self, lat: f64, lng: f64, address: impl Into<String>) -> LocationState {
        self.publish(LocationState::located(lat, lng, address))
    }

    fn recent_fix(&self) -> Option<Position> {
        let guard = self.lock_fix();
        let (position, taken) = (*guard)?;
        (taken.elapsed() <= self.options.maximum_age).then_some(position)
    }

    fn lock_fix(&self) -> std::sync::MutexGuard<'_, Option<(Position, Instant)>> {
        self.last_fix
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, next: LocationState) -> LocationState {
        self.state.send_replace(next.clone());
        next
    }
}

fn located(position: Position) -> LocationState {
    LocationState::located(position.latitude, position.longitude, CURRENT_LOCATION)
}
