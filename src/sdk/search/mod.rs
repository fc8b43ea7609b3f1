pub mod cache;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod ranking;
pub mod service;

pub use cache::{CacheEntry, SearchCache, CACHE_TTL};
pub use error::SearchError;
pub use orchestrator::SearchOrchestrator;
pub use provider::{FallbackCarparkSource, MockCarparkSource, RemoteCarparkSource};
pub use ranking::{rank_carparks, total_cost};
pub use service::CarparkSource;
