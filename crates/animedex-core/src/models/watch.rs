use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// User's tracking status for a title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchStatus {
    #[default]
    Planning,
    Watching,
    Completed,
    #[serde(rename = "On Hold")]
    OnHold,
    Dropped,
}

impl WatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::Watching => "Watching",
            Self::Completed => "Completed",
            Self::OnHold => "On Hold",
            Self::Dropped => "Dropped",
        }
    }

    /// Parse user input; accepts display names and snake/kebab-case forms.
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "planning" | "plantowatch" => Some(Self::Planning),
            "watching" => Some(Self::Watching),
            "completed" => Some(Self::Completed),
            "onhold" => Some(Self::OnHold),
            "dropped" => Some(Self::Dropped),
            _ => None,
        }
    }

    pub const ALL: &[WatchStatus] = &[
        Self::Planning,
        Self::Watching,
        Self::Completed,
        Self::OnHold,
        Self::Dropped,
    ];
}

impl std::fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-title tracking record, stored under `anime_status_<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchStatusRecord {
    pub status: WatchStatus,
    pub episodes_watched: u32,
    pub personal_rating: f32,
    pub notes: String,
    pub last_updated: DateTime<Utc>,
}

impl WatchStatusRecord {
    /// The record a title has before the user has touched it.
    pub fn new_default(now: DateTime<Utc>) -> Self {
        Self {
            status: WatchStatus::Planning,
            episodes_watched: 0,
            personal_rating: 0.0,
            notes: String::new(),
            last_updated: now,
        }
    }

    /// Merge the set fields of `patch` into this record and stamp it.
    pub fn apply(&mut self, patch: WatchStatusPatch, now: DateTime<Utc>) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(episodes) = patch.episodes_watched {
            self.episodes_watched = episodes;
        }
        if let Some(rating) = patch.personal_rating {
            self.personal_rating = rating;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        self.last_updated = now;
    }
}

/// A partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchStatusPatch {
    pub status: Option<WatchStatus>,
    pub episodes_watched: Option<u32>,
    pub personal_rating: Option<f32>,
    pub notes: Option<String>,
}

impl WatchStatusPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.episodes_watched.is_none()
            && self.personal_rating.is_none()
            && self.notes.is_none()
    }

    /// Check the patch against the title's known episode count.
    pub fn validate(&self, known_episodes: Option<u32>) -> Result<(), ValidationError> {
        if let Some(episodes) = self.episodes_watched {
            validate_episode_input(i64::from(episodes), known_episodes)?;
        }
        if let Some(rating) = self.personal_rating {
            validate_rating(rating)?;
        }
        Ok(())
    }
}

/// Validate a raw episode count as typed by the user.
///
/// An unknown or zero total means the bound is not enforced.
pub fn validate_episode_input(raw: i64, known_episodes: Option<u32>) -> Result<u32, ValidationError> {
    if raw < 0 {
        return Err(ValidationError::NegativeEpisodes(raw));
    }
    let watched = u32::try_from(raw).map_err(|_| ValidationError::EpisodesTooLarge(raw))?;
    match known_episodes {
        Some(total) if total > 0 && watched > total => {
            Err(ValidationError::EpisodesExceedTotal { watched, total })
        }
        _ => Ok(watched),
    }
}

/// Ratings run 0 to 10 inclusive in half steps.
pub fn validate_rating(rating: f32) -> Result<f32, ValidationError> {
    if !rating.is_finite() || !(0.0..=10.0).contains(&rating) {
        return Err(ValidationError::RatingOutOfRange(rating));
    }
    if (rating * 2.0).fract() != 0.0 {
        return Err(ValidationError::RatingNotHalfStep(rating));
    }
    Ok(rating)
}
