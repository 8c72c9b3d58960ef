//! Client-side filtering and sorting over fetched catalog items.
//!
//! Everything here is pure; the input slice is never mutated.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::CatalogItem;

/// Airing-status filter. `All` is the "no filtering" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Only(String),
}

impl FromStr for StatusFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Only(s.to_string()))
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    /// Score, highest first; unscored items count as 0.
    #[default]
    Rating,
    /// Title A to Z, accent- and case-insensitive.
    Title,
    /// Highest id first.
    Newest,
    /// Popularity rank, best first; unranked items last.
    Popularity,
    /// Episode count, most first.
    Episodes,
    /// Keep input order.
    None,
}

impl SortKey {
    pub const ALL: &[SortKey] = &[
        Self::Rating,
        Self::Title,
        Self::Newest,
        Self::Popularity,
        Self::Episodes,
        Self::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::Title => "title",
            Self::Newest => "newest",
            Self::Popularity => "popularity",
            Self::Episodes => "episodes",
            Self::None => "none",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sort key: {s}"))
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keep items whose status matches case-insensitively.
pub fn filter_by_status(items: &[CatalogItem], status: &StatusFilter) -> Vec<CatalogItem> {
    match status {
        StatusFilter::All => items.to_vec(),
        StatusFilter::Only(wanted) => {
            let wanted = wanted.to_lowercase();
            items
                .iter()
                .filter(|item| {
                    item.status
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase() == wanted)
                })
                .cloned()
                .collect()
        }
    }
}

/// Keep items that carry at least one of `genres`. An empty set keeps everything.
pub fn filter_by_genres(items: &[CatalogItem], genres: &[String]) -> Vec<CatalogItem> {
    if genres.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| item.genres().iter().any(|g| genres.contains(g)))
        .cloned()
        .collect()
}

/// Keep items whose id is in `favorites`.
pub fn filter_favorites(items: &[CatalogItem], favorites: &[u64]) -> Vec<CatalogItem> {
    items
        .iter()
        .filter(|item| favorites.contains(&item.id))
        .cloned()
        .collect()
}

/// Stable sort by `key`; items with equal keys keep their relative order.
pub fn sort_items(items: &[CatalogItem], key: SortKey) -> Vec<CatalogItem> {
    let mut sorted = items.to_vec();
    match key {
        SortKey::Rating => sorted.sort_by(|a, b| {
            b.rating
                .unwrap_or(0.0)
                .total_cmp(&a.rating.unwrap_or(0.0))
        }),
        SortKey::Title => sorted.sort_by(|a, b| compare_titles(&a.title, &b.title)),
        SortKey::Newest => sorted.sort_by(|a, b| b.id.cmp(&a.id)),
        SortKey::Popularity => sorted.sort_by(|a, b| match (a.popularity, b.popularity) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
        SortKey::Episodes => {
            sorted.sort_by(|a, b| b.episodes.unwrap_or(0).cmp(&a.episodes.unwrap_or(0)))
        }
        SortKey::None => {}
    }
    sorted
}

/// Compare titles the way a reader would: accents and case only break ties
/// between otherwise-equal letters.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| fold_case(a).cmp(&fold_case(b)))
}

/// Strip diacritics and fold case.
fn collation_key(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn fold_case(s: &str) -> String {
    s.nfkc().flat_map(char::to_lowercase).collect()
}

/// The full filter pipeline of the browse view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub status: StatusFilter,
    pub genres: Vec<String>,
    pub sort: SortKey,
}

impl CatalogQuery {
    /// Status filter, then genre filter, then sort.
    pub fn apply(&self, items: &[CatalogItem]) -> Vec<CatalogItem> {
        let filtered = filter_by_status(items, &self.status);
        let filtered = filter_by_genres(&filtered, &self.genres);
        sort_items(&filtered, self.sort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64, title: &str) -> CatalogItem {
        CatalogItem::new(id, title)
    }

    fn with_status(id: u64, status: Option<&str>) -> CatalogItem {
        let mut it = item(id, "x");
        it.status = status.map(Into::into);
        it
    }

    fn with_genres(id: u64, genres: &[&str]) -> CatalogItem {
        let mut it = item(id, "x");
        it.genres = Some(genres.iter().map(|g| g.to_string()).collect());
        it
    }

    fn ids(items: &[CatalogItem]) -> Vec<u64> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_status_filter_is_case_insensitive() {
        let items = vec![
            with_status(1, Some("Finished Airing")),
            with_status(2, Some("Currently Airing")),
            with_status(3, None),
        ];
        let only: StatusFilter = "currently airing".parse().unwrap();
        assert_eq!(ids(&filter_by_status(&items, &only)), vec![2]);
        assert_eq!(ids(&filter_by_status(&items, &StatusFilter::All)), vec![1, 2, 3]);
        assert_eq!("ALL".parse::<StatusFilter>().unwrap(), StatusFilter::All);
    }

    #[test]
    fn test_genre_filter_is_any_match() {
        let items = vec![
            with_genres(1, &["Action", "Drama"]),
            with_genres(2, &["Comedy"]),
            item(3, "no genres"),
        ];
        let wanted = vec!["Drama".to_string(), "Romance".to_string()];
        assert_eq!(ids(&filter_by_genres(&items, &wanted)), vec![1]);
        assert_eq!(ids(&filter_by_genres(&items, &[])), vec![1, 2, 3]);
    }

    #[test]
    fn test_favorites_filter() {
        let items = vec![item(1, "a"), item(2, "b"), item(3, "c")];
        assert_eq!(ids(&filter_favorites(&items, &[3, 1])), vec![1, 3]);
    }

    #[test]
    fn test_title_sort_is_stable() {
        let items = vec![item(1, "B"), item(2, "A"), item(3, "A")];
        assert_eq!(ids(&sort_items(&items, SortKey::Title)), vec![2, 3, 1]);
    }

    #[test]
    fn test_title_sort_ignores_case_and_accents() {
        let items = vec![
            item(1, "zetman"),
            item(2, "Érased"),
            item(3, "Akira"),
            item(4, "eureka Seven"),
        ];
        assert_eq!(ids(&sort_items(&items, SortKey::Title)), vec![3, 2, 4, 1]);
    }

    #[test]
    fn test_rating_sort_treats_missing_as_zero() {
        let mut a = item(1, "a");
        a.rating = Some(7.5);
        let b = item(2, "b");
        let mut c = item(3, "c");
        c.rating = Some(9.1);
        let mut d = item(4, "d");
        d.rating = Some(0.0);

        let sorted = sort_items(&[a, b, c, d], SortKey::Rating);
        assert_eq!(ids(&sorted), vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_newest_sort_and_none() {
        let items = vec![item(5, "a"), item(50, "b"), item(20, "c")];
        assert_eq!(ids(&sort_items(&items, SortKey::Newest)), vec![50, 20, 5]);
        assert_eq!(ids(&sort_items(&items, SortKey::None)), vec![5, 50, 20]);
    }

    #[test]
    fn test_popularity_and_episodes_sort() {
        let mut a = item(1, "a");
        a.popularity = Some(300);
        a.episodes = Some(12);
        let b = item(2, "b");
        let mut c = item(3, "c");
        c.popularity = Some(4);
        c.episodes = Some(500);

        let items = vec![a, b, c];
        assert_eq!(ids(&sort_items(&items, SortKey::Popularity)), vec![3, 1, 2]);
        assert_eq!(ids(&sort_items(&items, SortKey::Episodes)), vec![3, 1, 2]);
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("Title".parse::<SortKey>().unwrap(), SortKey::Title);
        assert!("random".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_query_pipeline() {
        let mut a = with_genres(1, &["Action"]);
        a.status = Some("Finished Airing".into());
        a.rating = Some(8.0);
        let mut b = with_genres(2, &["Action"]);
        b.status = Some("Finished Airing".into());
        b.rating = Some(9.0);
        let mut c = with_genres(3, &["Comedy"]);
        c.status = Some("Finished Airing".into());

        let query = CatalogQuery {
            status: "finished airing".parse().unwrap(),
            genres: vec!["Action".into()],
            sort: SortKey::Rating,
        };
        assert_eq!(ids(&query.apply(&[a, b, c])), vec![2, 1]);
    }
}
