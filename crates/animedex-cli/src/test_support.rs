use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta};

use animedex_api::{CatalogError, CatalogSource};
use animedex_core::clock::ManualClock;
use animedex_core::kv::MemoryStore;
use animedex_core::models::CatalogItem;

use crate::app::App;

pub fn item(id: u64, title: &str, rating: f32, episodes: u32, status: &str, genres: &[&str]) -> CatalogItem {
    let mut it = CatalogItem::new(id, title);
    it.rating = Some(rating);
    it.episodes = Some(episodes);
    it.status = Some(status.into());
    it.genres = Some(genres.iter().map(|g| g.to_string()).collect());
    it
}

/// Fixed catalog with a scripted failure hook.
#[derive(Default)]
pub struct FakeSource {
    pub top: Vec<CatalogItem>,
    pub by_id: HashMap<u64, CatalogItem>,
    pub calls: AtomicUsize,
    pub fail_next: Mutex<Option<CatalogError>>,
}

impl FakeSource {
    pub fn with_items(items: Vec<CatalogItem>) -> Self {
        Self {
            by_id: items.iter().map(|i| (i.id, i.clone())).collect(),
            top: items,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, e: CatalogError) {
        *self.fail_next.lock().unwrap() = Some(e);
    }

    fn outcome<T>(&self, value: T) -> Result<T, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_next.lock().unwrap().take() {
            Some(e) => Err(e),
            None => Ok(value),
        }
    }
}

impl CatalogSource for FakeSource {
    async fn search(&self, query: &str) -> Result<Vec<CatalogItem>, CatalogError> {
        let q = query.to_lowercase();
        let hits = self
            .top
            .iter()
            .filter(|i| i.title.to_lowercase().contains(&q))
            .cloned()
            .collect();
        self.outcome(hits)
    }

    async fn get_details(&self, id: u64) -> Result<Option<CatalogItem>, CatalogError> {
        self.outcome(self.by_id.get(&id).cloned())
    }

    async fn get_top(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        self.outcome(self.top.clone())
    }
}

pub fn sample_items() -> Vec<CatalogItem> {
    vec![
        item(1, "Cowboy Bebop", 8.75, 26, "Finished Airing", &["Action", "Sci-Fi"]),
        item(19, "Monster", 8.88, 74, "Finished Airing", &["Drama", "Mystery"]),
        item(52991, "Sousou no Frieren", 9.31, 28, "Currently Airing", &["Adventure", "Drama"]),
    ]
}

pub fn app() -> (App<FakeSource>, Arc<MemoryStore>, Arc<ManualClock>) {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(
        DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
    ));
    let app = App::with_clock(
        FakeSource::with_items(sample_items()),
        store.clone(),
        clock.clone(),
        TimeDelta::minutes(30),
    );
    (app, store, clock)
}
