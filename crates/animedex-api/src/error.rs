use thiserror::Error;

/// Fallback text when the upstream error body carries no message.
pub const DEFAULT_API_MESSAGE: &str = "Failed to fetch data from API";

/// Errors from a catalog client. Callers decide on retries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("rate limit exceeded, please try again later")]
    RateLimited,

    /// Non-2xx answer (`status` set) or transport failure (`status` unset).
    #[error("API error: {message}")]
    Api { status: Option<u16>, message: String },

    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Self::Unknown(e.to_string());
        }
        Self::Api {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}
