use thiserror::Error;

/// Shown when a failure carries nothing useful for the user.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Missing lat/lng parameters")]
    MissingCoordinates,

    #[error("Invalid {name} parameter: {value}")]
    InvalidParameter { name: &'static str, value: String },

    // Carries the HTTP status text, e.g. "Internal Server Error"
    #[error("Search failed: {0}")]
    Status(String),

    #[error("Search was superseded by a newer one")]
    Superseded,

    #[error("No previous search to retry")]
    NothingToRetry,

    #[error("Underlying request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl SearchError {
    /// Text for the `error` search state.
    pub fn user_message(&self) -> String {
        match self {
            SearchError::ParseError(_) => GENERIC_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}
