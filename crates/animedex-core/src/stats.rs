//! Aggregate statistics for the dashboard view.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::CatalogItem;

/// Number of genres reported by [`genre_distribution`].
pub const TOP_GENRES: usize = 5;

/// Status that counts towards the completion rate.
pub const COMPLETED_STATUS: &str = "Completed";

/// Label used for items without a status.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// A labelled count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub mean_rating: f64,
    pub top_genre: Option<String>,
    /// Percentage, 0 to 100.
    pub completion_rate: f64,
}

/// Everything the dashboard shows, computed in one pass over the caller's list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStatistics {
    pub summary: Summary,
    pub genres: Vec<Bucket>,
    pub ratings: Vec<Bucket>,
    pub statuses: Vec<Bucket>,
}

impl CatalogStatistics {
    pub fn compute(items: &[CatalogItem]) -> Self {
        Self {
            summary: summary(items),
            genres: genre_distribution(items),
            ratings: rating_histogram(items),
            statuses: status_distribution(items),
        }
    }
}

/// Count labels, keeping first-seen order.
fn count_in_order<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = Vec::new();
    for label in labels {
        match buckets.iter_mut().find(|b| b.label == label) {
            Some(bucket) => bucket.count += 1,
            None => buckets.push(Bucket {
                label: label.to_string(),
                count: 1,
            }),
        }
    }
    buckets
}

/// The [`TOP_GENRES`] most frequent genres, most frequent first.
///
/// Ties keep the order in which genres were first encountered.
pub fn genre_distribution(items: &[CatalogItem]) -> Vec<Bucket> {
    let mut buckets = count_in_order(
        items
            .iter()
            .flat_map(|item| item.genres().iter().map(String::as_str)),
    );
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets.truncate(TOP_GENRES);
    buckets
}

/// Items bucketed by whole rating point, labelled `"{n}-{n+1}"` and sorted by label.
///
/// Unrated items land in `"0-1"`.
pub fn rating_histogram(items: &[CatalogItem]) -> Vec<Bucket> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for item in items {
        let floor = item.rating.unwrap_or(0.0).floor() as i64;
        *counts.entry(format!("{}-{}", floor, floor + 1)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(label, count)| Bucket { label, count })
        .collect()
}

/// Count of each status string, first-seen order.
pub fn status_distribution(items: &[CatalogItem]) -> Vec<Bucket> {
    count_in_order(
        items
            .iter()
            .map(|item| item.status.as_deref().unwrap_or(UNKNOWN_STATUS)),
    )
}

pub fn summary(items: &[CatalogItem]) -> Summary {
    let total = items.len();
    if total == 0 {
        return Summary {
            total: 0,
            mean_rating: 0.0,
            top_genre: None,
            completion_rate: 0.0,
        };
    }

    let rating_sum: f64 = items
        .iter()
        .map(|item| f64::from(item.rating.unwrap_or(0.0)))
        .sum();
    let completed = items
        .iter()
        .filter(|item| item.status.as_deref() == Some(COMPLETED_STATUS))
        .count();

    Summary {
        total,
        mean_rating: rating_sum / total as f64,
        top_genre: genre_distribution(items).into_iter().next().map(|b| b.label),
        completion_rate: completed as f64 / total as f64 * 100.0,
    }
}
