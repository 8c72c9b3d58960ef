//! Plain-text rendering of catalog items, watch records, and statistics.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use animedex_core::models::{CatalogItem, WatchStatusRecord};
use animedex_core::stats::{Bucket, CatalogStatistics};

const TITLE_WIDTH: usize = 40;

pub fn score(rating: Option<f32>) -> String {
    rating.map_or_else(|| "-".into(), |r| format!("{r:.2}"))
}

pub fn episodes(count: Option<u32>) -> String {
    count.map_or_else(|| "?".into(), |n| n.to_string())
}

/// Cut `s` to `width` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Human-readable age of `dt` relative to `now`.
pub fn relative_time(dt: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - dt).num_seconds().max(0);
    if secs < 60 {
        "just now".into()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86400)
    }
}

/// One row per item; favorites are starred.
pub fn item_table(items: &[CatalogItem], favorites: &[u64]) -> String {
    if items.is_empty() {
        return "No anime found.".into();
    }
    let mut out = format!(
        "  {:>6}  {:<TITLE_WIDTH$}  {:>5}  {:>4}  {}",
        "ID", "TITLE", "SCORE", "EPS", "STATUS"
    );
    for item in items {
        let star = if favorites.contains(&item.id) { '*' } else { ' ' };
        let _ = write!(
            out,
            "\n{star} {:>6}  {:<TITLE_WIDTH$}  {:>5}  {:>4}  {}",
            item.id,
            truncate(item.display_title(), TITLE_WIDTH),
            score(item.rating),
            episodes(item.episodes),
            item.status.as_deref().unwrap_or("-"),
        );
    }
    out
}

pub fn item_details(item: &CatalogItem, record: &WatchStatusRecord, favorite: bool) -> String {
    let mut out = item.title.clone();
    if favorite {
        out.push_str("  *");
    }
    let mut field = |label: &str, value: &str| {
        if !value.is_empty() {
            let _ = write!(out, "\n{label:<10} {value}");
        }
    };
    field("English", item.title_english.as_deref().unwrap_or_default());
    field("Japanese", item.title_japanese.as_deref().unwrap_or_default());
    field("Type", item.media_type.as_deref().unwrap_or_default());
    field("Status", item.status.as_deref().unwrap_or_default());
    field("Score", &score(item.rating));
    field("Episodes", &episodes(item.episodes));
    field("Duration", item.duration.as_deref().unwrap_or_default());
    field("Source", item.source.as_deref().unwrap_or_default());
    field("Genres", &item.genres().join(", "));
    if let Some(aired) = &item.aired {
        let to = aired.to.as_deref().unwrap_or("?");
        field("Aired", &format!("{} to {to}", aired.from));
    }
    if let Some(rank) = item.popularity {
        field("Popularity", &format!("#{rank}"));
    }
    if let Some(members) = item.members {
        field("Members", &members.to_string());
    }
    if let Some(trailer) = &item.trailer {
        field("Trailer", &trailer.url);
    }
    field("Image", &item.image);

    let _ = write!(
        out,
        "\n\nYour status: {} ({} / {} episodes, rating {})",
        record.status,
        record.episodes_watched,
        episodes(item.episodes),
        record.personal_rating,
    );
    if !record.notes.is_empty() {
        let _ = write!(out, "\nNotes: {}", record.notes);
    }
    if !item.description.is_empty() {
        let _ = write!(out, "\n\n{}", item.description);
    }
    out
}

pub fn watch_record(id: u64, record: &WatchStatusRecord, now: DateTime<Utc>) -> String {
    let mut out = format!(
        "{id}: {} | {} episodes | rating {} | updated {}",
        record.status,
        record.episodes_watched,
        record.personal_rating,
        relative_time(record.last_updated, now),
    );
    if !record.notes.is_empty() {
        let _ = write!(out, "\n  {}", record.notes);
    }
    out
}

fn buckets(out: &mut String, heading: &str, buckets: &[Bucket]) {
    let _ = write!(out, "\n\n{heading}");
    if buckets.is_empty() {
        out.push_str("\n  (none)");
    }
    for b in buckets {
        let _ = write!(out, "\n  {:<20} {}", b.label, b.count);
    }
}

pub fn statistics(stats: &CatalogStatistics) -> String {
    let s = &stats.summary;
    let mut out = format!(
        "Total anime:     {}\nAverage rating:  {:.2}\nTop genre:       {}\nCompletion rate: {:.1}%",
        s.total,
        s.mean_rating,
        s.top_genre.as_deref().unwrap_or("N/A"),
        s.completion_rate,
    );
    buckets(&mut out, "Genres", &stats.genres);
    buckets(&mut out, "Ratings", &stats.ratings);
    buckets(&mut out, "Statuses", &stats.statuses);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("Monster", 10), "Monster");
        assert_eq!(truncate("葬送のフリーレン", 4), "葬送の…");
    }

    #[test]
    fn test_relative_time() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let ago = |secs| relative_time(now - chrono::TimeDelta::seconds(secs), now);
        assert_eq!(ago(5), "just now");
        assert_eq!(ago(120), "2m ago");
        assert_eq!(ago(7200), "2h ago");
        assert_eq!(ago(3 * 86400), "3d ago");
        assert_eq!(relative_time(now + chrono::TimeDelta::seconds(30), now), "just now");
    }

    #[test]
    fn test_item_table_marks_favorites() {
        let mut bebop = CatalogItem::new(1, "Cowboy Bebop");
        bebop.rating = Some(8.75);
        bebop.episodes = Some(26);
        let table = item_table(&[bebop, CatalogItem::new(2, "Upcoming")], &[1]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with('*'));
        assert!(lines[1].contains("8.75"));
        assert!(lines[2].starts_with(' '));
        assert!(lines[2].contains('?'));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(item_table(&[], &[]), "No anime found.");
    }

    #[test]
    fn test_statistics_summary_lines() {
        let mut item = CatalogItem::new(1, "Mushishi");
        item.rating = Some(8.0);
        item.status = Some("Completed".into());
        let text = statistics(&CatalogStatistics::compute(&[item]));
        assert!(text.contains("Total anime:     1"));
        assert!(text.contains("Completion rate: 100.0%"));
        assert!(text.contains("Top genre:       N/A"));
        assert!(text.contains("8-9"));
    }
}
