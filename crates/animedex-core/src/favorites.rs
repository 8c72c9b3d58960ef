//! Favorited title ids, persisted as a JSON array under `anime_favorites`.

use crate::error::AnimedexError;
use crate::kv::SharedStore;

pub const FAVORITES_KEY: &str = "anime_favorites";

/// Read-modify-write set of favorite ids. Insertion order is kept and no id
/// appears twice. Concurrent writers are not coordinated: last write wins.
#[derive(Clone)]
pub struct FavoritesStore {
    store: SharedStore,
}

impl FavoritesStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Current favorites. Unreadable state is logged and reads as empty.
    pub fn list(&self) -> Vec<u64> {
        match self.load() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(error = %e, "Error reading favorites");
                Vec::new()
            }
        }
    }

    pub fn is_favorite(&self, id: u64) -> bool {
        self.list().contains(&id)
    }

    /// Add `id`; a no-op if it is already a favorite.
    pub fn add(&self, id: u64) -> Result<(), AnimedexError> {
        let mut ids = self.list();
        if ids.contains(&id) {
            return Ok(());
        }
        ids.push(id);
        self.save(&ids)
    }

    /// Remove `id`; a no-op if it is not a favorite.
    pub fn remove(&self, id: u64) -> Result<(), AnimedexError> {
        let mut ids = self.list();
        let before = ids.len();
        ids.retain(|&f| f != id);
        if ids.len() == before {
            return Ok(());
        }
        self.save(&ids)
    }

    /// Flip membership; returns whether `id` is a favorite afterwards.
    pub fn toggle(&self, id: u64) -> Result<bool, AnimedexError> {
        if self.is_favorite(id) {
            self.remove(id)?;
            Ok(false)
        } else {
            self.add(id)?;
            Ok(true)
        }
    }

    fn load(&self) -> Result<Vec<u64>, AnimedexError> {
        let Some(raw) = self.store.get(FAVORITES_KEY)? else {
            return Ok(Vec::new());
        };
        let mut ids: Vec<u64> = serde_json::from_str(&raw)?;
        // Tolerate hand-edited state with repeats.
        let mut seen = std::collections::HashSet::new();
        ids.retain(|id| seen.insert(*id));
        Ok(ids)
    }

    fn save(&self, ids: &[u64]) -> Result<(), AnimedexError> {
        self.store.set(FAVORITES_KEY, &serde_json::to_string(ids)?)
    }
}
