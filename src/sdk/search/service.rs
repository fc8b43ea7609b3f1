use super::error::SearchError;
use crate::sdk::carpark::{Carpark, SearchParams};
use async_trait::async_trait;

#[async_trait]
pub trait CarparkSource: Send + Sync {
    /// Returns the carparks around `params`, priced for its duration and
    /// ordered cheapest first.
    async fn search(&self, params: &SearchParams) -> Result<Vec<Carpark>, SearchError>;
}
