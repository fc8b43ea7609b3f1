use crate::sdk::carpark::Carpark;
use serde::{Deserialize, Serialize};

// --- Wire shapes of the carpark search endpoint ---

/// Responses are either wrapped in `results` or a bare list.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum SearchResponse {
    Wrapped { results: Vec<Carpark> },
    Bare(Vec<Carpark>),
}

impl SearchResponse {
    pub fn into_results(self) -> Vec<Carpark> {
        match self {
            SearchResponse::Wrapped { results } | SearchResponse::Bare(results) => results,
        }
    }
}

#[derive(Serialize)]
pub struct SearchResults<'a> {
    pub results: &'a [Carpark],
}
