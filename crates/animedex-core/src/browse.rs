//! Session state of the browse view: the loaded list, the active filters,
//! and a dismissible notice for failed loads.

use std::fmt::Display;
use std::str::FromStr;

use crate::catalog::{filter_favorites, CatalogQuery};
use crate::models::CatalogItem;
use crate::stats::CatalogStatistics;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    All,
    Favorites,
    Stats,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "favorites" | "favs" => Ok(Self::Favorites),
            "stats" => Ok(Self::Stats),
            other => Err(format!("unknown view: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BrowseState {
    items: Vec<CatalogItem>,
    notice: Option<String>,
    pub view: ViewMode,
    pub query: CatalogQuery,
}

impl BrowseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last successfully loaded list, unfiltered.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Take the outcome of a load.
    ///
    /// Success replaces the list and clears the notice. Failure keeps the
    /// current list and raises a notice prefixed with `context`.
    pub fn apply_load<E: Display>(&mut self, result: Result<Vec<CatalogItem>, E>, context: &str) {
        match result {
            Ok(items) => {
                self.items = items;
                self.notice = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "{context}");
                self.notice = Some(format!("{context}: {e}"));
            }
        }
    }

    /// Raise a notice without touching the list.
    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    /// Items as the current view shows them: favorites view narrows to
    /// `favorites`, then status, genre, and sort apply.
    pub fn visible(&self, favorites: &[u64]) -> Vec<CatalogItem> {
        match self.view {
            ViewMode::Favorites => self.query.apply(&filter_favorites(&self.items, favorites)),
            ViewMode::All | ViewMode::Stats => self.query.apply(&self.items),
        }
    }

    /// Dashboard numbers over the favorited items of the loaded list.
    pub fn statistics(&self, favorites: &[u64]) -> CatalogStatistics {
        CatalogStatistics::compute(&filter_favorites(&self.items, favorites))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SortKey;

    fn items() -> Vec<CatalogItem> {
        let mut a = CatalogItem::new(1, "Monster");
        a.rating = Some(8.9);
        let mut b = CatalogItem::new(2, "Mushishi");
        b.rating = Some(8.7);
        vec![a, b]
    }

    #[test]
    fn test_failed_load_keeps_last_list() {
        let mut state = BrowseState::new();
        state.apply_load::<String>(Ok(items()), "Failed to load top anime");
        assert_eq!(state.items().len(), 2);

        state.apply_load::<String>(Err("rate limit exceeded".into()), "Failed to search anime");
        assert_eq!(state.items().len(), 2);
        assert_eq!(
            state.notice(),
            Some("Failed to search anime: rate limit exceeded")
        );

        state.dismiss_notice();
        assert_eq!(state.notice(), None);
    }

    #[test]
    fn test_successful_load_clears_notice() {
        let mut state = BrowseState::new();
        state.set_notice("stale");
        state.apply_load::<String>(Ok(vec![]), "ctx");
        assert!(state.notice().is_none());
        assert!(state.items().is_empty());
    }

    #[test]
    fn test_favorites_view_and_sort() {
        let mut state = BrowseState::new();
        state.apply_load::<String>(Ok(items()), "ctx");
        state.query.sort = SortKey::Title;

        let all: Vec<u64> = state.visible(&[2]).iter().map(|i| i.id).collect();
        assert_eq!(all, vec![1, 2]);

        state.view = ViewMode::Favorites;
        let favs: Vec<u64> = state.visible(&[2]).iter().map(|i| i.id).collect();
        assert_eq!(favs, vec![2]);

        assert_eq!(state.statistics(&[2]).summary.total, 1);
    }

    #[test]
    fn test_view_mode_parse() {
        assert_eq!("Favorites".parse::<ViewMode>().unwrap(), ViewMode::Favorites);
        assert!("grid".parse::<ViewMode>().is_err());
    }
}
