use super::carpark::{Carpark, LocationState, LocationStatus, SearchParams, DEFAULT_RADIUS_M};
use super::geocode::{AddressSuggestion, AddressSuggestionClient, MIN_QUERY_CHARS};
use super::location::GeolocationProvider;
use super::search::{SearchError, SearchOrchestrator};
use super::util::debounce::Debouncer;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// Autocomplete list. Every keystroke or clear starts a new round, and a
/// lookup may only publish into the round it was started in.
struct Dropdown {
    round: Mutex<u64>,
    list: watch::Sender<Vec<AddressSuggestion>>,
}

impl Dropdown {
    fn new() -> Self {
        let (list, _) = watch::channel(Vec::new());
        Self {
            round: Mutex::new(0),
            list,
        }
    }

    fn lock_round(&self) -> MutexGuard<'_, u64> {
        self.round
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_round(&self) -> u64 {
        let mut round = self.lock_round();
        *round += 1;
        *round
    }

    fn clear(&self) {
        let mut round = self.lock_round();
        *round += 1;
        self.list.send_replace(Vec::new());
    }

    fn publish(&self, round: u64, results: Vec<AddressSuggestion>) -> bool {
        let current = self.lock_round();
        if *current != round {
            return false;
        }
        self.list.send_replace(results);
        true
    }
}

/// Everything one user interaction needs: where they are heading, their
/// search, and the autocomplete dropdown.
pub struct Session {
    location: GeolocationProvider,
    search: SearchOrchestrator,
    suggestions: Option<Arc<AddressSuggestionClient>>,
    debouncer: Debouncer,
    suggested: Arc<Dropdown>,
    radius_m: f64,
}

impl Session {
    pub fn new(
        location: GeolocationProvider,
        search: SearchOrchestrator,
        suggestions: Option<Arc<AddressSuggestionClient>>,
    ) -> Self {
        Self {
            location,
            search,
            suggestions,
            debouncer: Debouncer::default(),
            suggested: Arc::new(Dropdown::new()),
            radius_m: DEFAULT_RADIUS_M,
        }
    }

    pub fn with_radius(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn location(&self) -> &GeolocationProvider {
        &self.location
    }

    pub fn search_orchestrator(&self) -> &SearchOrchestrator {
        &self.search
    }

    pub fn can_search(&self) -> bool {
        self.location.can_search()
    }

    /// Resolves the device position. A fix closes the autocomplete dropdown.
    pub async fn locate(&self) -> LocationState {
        let state = self.location.get_current_location().await;
        if state.status == LocationStatus::Success {
            self.clear_suggestions();
        }
        state
    }

    /// Uses a picked address as the destination and clears stale results.
    pub fn select_address(&self, suggestion: &AddressSuggestion) -> LocationState {
        self.clear_suggestions();
        let state = self
            .location
            .set_location(suggestion.lat, suggestion.lng, suggestion.address.clone());
        self.search.reset();
        state
    }

    /// Searches around the current destination for `duration_hours`.
    pub async fn search(&self, duration_hours: f64) -> Result<Vec<Carpark>, SearchError> {
        let (lat, lng) = self
            .location
            .state()
            .coordinates()
            .ok_or(SearchError::MissingCoordinates)?;
        let params = SearchParams::new(lat, lng, duration_hours, self.radius_m)?;
        log::info!("Searching carparks around ({}, {}) for {}h", lat, lng, duration_hours);
        self.search.search(params).await
    }

    pub async fn retry(&self) -> Result<Vec<Carpark>, SearchError> {
        self.search.retry().await
    }

    /// Feeds the autocomplete box. Lookups run after the debounce delay and
    /// land in [`Session::suggestions`]; short input clears the list at once.
    pub fn type_query(&self, query: &str) {
        let Some(client) = self.suggestions.clone() else {
            return;
        };
        if query.chars().count() < MIN_QUERY_CHARS {
            self.clear_suggestions();
            return;
        }

        let query = query.to_string();
        let suggested = self.suggested.clone();
        let round = suggested.next_round();
        self.debouncer.call(move || async move {
            let results = client.search_addresses(&query).await;
            if !suggested.publish(round, results) {
                log::debug!("Dropping stale suggestions for {:?}", query);
            }
        });
    }

    pub fn suggestions(&self) -> watch::Receiver<Vec<AddressSuggestion>> {
        self.suggested.list.subscribe()
    }

    /// Empties the dropdown and invalidates every lookup started so far.
    fn clear_suggestions(&self) {
        self.debouncer.cancel();
        self.suggested.clear();
    }
}
