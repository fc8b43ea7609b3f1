use super::cache::SearchCache;
use super::error::SearchError;
use super::service::CarparkSource;
use crate::sdk::carpark::{Carpark, SearchParams, SearchState};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct InFlight {
    generation: u64,
    token: Option<CancellationToken>,
    last_params: Option<SearchParams>,
}

/// Owns the search state of one session.
///
/// At most one search is outstanding: starting a search cancels the previous
/// one, and a superseded search never writes to the state or the cache.
pub struct SearchOrchestrator {
    source: Arc<dyn CarparkSource>,
    cache: Mutex<SearchCache>,
    inflight: Mutex<InFlight>,
    state: watch::Sender<SearchState>,
}

impl SearchOrchestrator {
    pub fn new(source: Arc<dyn CarparkSource>, cache: SearchCache) -> Self {
        let (state, _) = watch::channel(SearchState::idle());
        Self {
            source,
            cache: Mutex::new(cache),
            inflight: Mutex::new(InFlight::default()),
            state,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn last_params(&self) -> Option<SearchParams> {
        self.lock_inflight().last_params
    }

    /// Runs a search for `params`, superseding any search still in flight.
    ///
    /// Returns `SearchError::Superseded` when a newer search or a reset
    /// started before this one finished; the state then belongs to the newer
    /// call and is left as is.
    pub async fn search(&self, params: SearchParams) -> Result<Vec<Carpark>, SearchError> {
        let (generation, token) = self.begin(params);
        let key = params.cache_key();

        let cached = self.lock_cache().get(&key);
        if let Some(results) = cached {
            log::debug!("[CACHE HIT] {}", key);
            self.publish(generation, SearchState::from_results(results.clone()));
            return Ok(results);
        }
        log::debug!("[CACHE MISS] {}", key);

        self.publish(generation, SearchState::loading());

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(SearchError::Superseded),
            result = self.source.search(&params) => result,
        };

        match outcome {
            Ok(results) => {
                let mut inflight = self.lock_inflight();
                if inflight.generation != generation {
                    return Err(SearchError::Superseded);
                }
                self.lock_cache().insert(key, results.clone());
                log::info!("Search found {} carparks", results.len());
                self.state.send_replace(SearchState::from_results(results.clone()));
                inflight.token = None;
                Ok(results)
            }
            Err(SearchError::Superseded) => {
                log::debug!("Search for {} was superseded", key);
                Err(SearchError::Superseded)
            }
            Err(e) => {
                if self.publish(generation, SearchState::failed(e.user_message())) {
                    log::error!("Carpark search failed: {}", e);
                    Err(e)
                } else {
                    Err(SearchError::Superseded)
                }
            }
        }
    }

    /// Re-runs the most recent search with the same parameters.
    pub async fn retry(&self) -> Result<Vec<Carpark>, SearchError> {
        let params = self.last_params().ok_or(SearchError::NothingToRetry)?;
        self.search(params).await
    }

    /// Back to `idle`. Also cancels any search in flight so its outcome is dropped.
    pub fn reset(&self) {
        let mut inflight = self.lock_inflight();
        inflight.generation += 1;
        if let Some(token) = inflight.token.take() {
            token.cancel();
        }
        self.state.send_replace(SearchState::idle());
    }

    fn begin(&self, params: SearchParams) -> (u64, CancellationToken) {
        let mut inflight = self.lock_inflight();
        if let Some(previous) = inflight.token.take() {
            previous.cancel();
        }
        inflight.generation += 1;
        let token = CancellationToken::new();
        inflight.token = Some(token.clone());
        inflight.last_params = Some(params);
        (inflight.generation, token)
    }

    /// Writes `next` only if `generation` is still the newest search.
    fn publish(&self, generation: u64, next: SearchState) -> bool {
        let inflight = self.lock_inflight();
        if inflight.generation != generation {
            return false;
        }
        self.state.send_replace(next);
        true
    }

    fn lock_inflight(&self) -> MutexGuard<'_, InFlight> {
        self.inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_cache(&self) -> MutexGuard<'_, SearchCache> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
