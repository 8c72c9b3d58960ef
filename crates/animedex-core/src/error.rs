use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnimedexError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Rejected user input, caught before anything reaches a store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("episodes must be a positive number (got {0})")]
    NegativeEpisodes(i64),

    #[error("episodes count is too large (got {0})")]
    EpisodesTooLarge(i64),

    #[error("episodes cannot exceed {total} (got {watched})")]
    EpisodesExceedTotal { watched: u32, total: u32 },

    #[error("rating must be between 0 and 10 (got {0})")]
    RatingOutOfRange(f32),

    #[error("rating must be a multiple of 0.5 (got {0})")]
    RatingNotHalfStep(f32),
}
