pub mod sdk;

pub use sdk::carpark::{Carpark, CarparkType, LocationState, SearchParams, SearchState, SearchStatus};
pub use sdk::config::{AppConfig, BackendConfig};
pub use sdk::geocode::{AddressSuggestion, AddressSuggestionClient};
pub use sdk::location::GeolocationProvider;
pub use sdk::navigation::NavigationLinkBuilder;
pub use sdk::search::{rank_carparks, CarparkSource, SearchCache, SearchError, SearchOrchestrator};
pub use sdk::session::Session;
