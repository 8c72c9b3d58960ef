//! Command dispatch over the cached catalog and the local stores.

use std::sync::Arc;

use chrono::TimeDelta;
use futures::StreamExt;
use serde::Serialize;

use animedex_api::{CachedCatalog, CatalogSource, JikanClient};
use animedex_core::cache::ResponseCache;
use animedex_core::catalog::{filter_favorites, CatalogQuery};
use animedex_core::clock::{Clock, SystemClock};
use animedex_core::config::AppConfig;
use animedex_core::favorites::FavoritesStore;
use animedex_core::kv::{SharedStore, SqliteStore};
use animedex_core::models::{
    validate_episode_input, validate_rating, CatalogItem, WatchStatusPatch, WatchStatusRecord,
};
use animedex_core::stats::CatalogStatistics;
use animedex_core::watch_status::WatchStatusStore;

use crate::cli::{CacheAction, Command, FavoritesAction, ListArgs, StatusAction};
use crate::error::CliError;
use crate::render;

pub struct App<S> {
    catalog: CachedCatalog<S>,
    favorites: FavoritesStore,
    watch: WatchStatusStore,
    clock: Arc<dyn Clock>,
}

#[derive(Serialize)]
struct TrackedEntry<'a> {
    id: u64,
    #[serde(flatten)]
    record: &'a WatchStatusRecord,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsReport<'a> {
    #[serde(flatten)]
    stats: &'a CatalogStatistics,
    unavailable: &'a [u64],
}

impl App<JikanClient> {
    /// Open the on-disk store and build the Jikan client from `config`.
    pub fn open(config: &AppConfig) -> Result<Self, CliError> {
        let path = AppConfig::ensure_store_path()?;
        tracing::debug!(path = %path.display(), "Opening store");
        let store: SharedStore = Arc::new(SqliteStore::open(&path)?);
        let client = JikanClient::from_config(&config.api)?;
        Ok(Self::new(client, store, config.cache.ttl()?))
    }
}

impl<S: CatalogSource> App<S> {
    pub fn new(source: S, store: SharedStore, ttl: TimeDelta) -> Self {
        Self::with_clock(source, store, Arc::new(SystemClock), ttl)
    }

    pub fn with_clock(
        source: S,
        store: SharedStore,
        clock: Arc<dyn Clock>,
        ttl: TimeDelta,
    ) -> Self {
        let cache = ResponseCache::with_clock(store.clone(), clock.clone(), ttl);
        Self {
            catalog: CachedCatalog::new(source, cache),
            favorites: FavoritesStore::new(store.clone()),
            watch: WatchStatusStore::with_clock(store, clock.clone()),
            clock,
        }
    }

    pub fn catalog(&self) -> &CachedCatalog<S> {
        &self.catalog
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    /// Run a one-shot command and return what it prints.
    pub async fn run(&self, command: Command) -> Result<String, CliError> {
        match command {
            Command::Top { list } => {
                let items = self.catalog.get_top().await?;
                self.list(items, &list)
            }
            Command::Search { query, list } => {
                let items = self.catalog.search(&query).await?;
                self.list(items, &list)
            }
            Command::Details { id, json } => self.details(id, json).await,
            Command::Favorites { action } => self.favorites_action(action),
            Command::Status { action } => self.status_action(action).await,
            Command::Stats { json } => self.stats(json).await,
            Command::Cache { action } => self.cache_action(action),
            Command::Browse => Err(CliError::Usage(
                "browse runs interactively and cannot be dispatched here".into(),
            )),
        }
    }

    fn list(&self, items: Vec<CatalogItem>, args: &ListArgs) -> Result<String, CliError> {
        let favorites = self.favorites.list();
        let items = if args.favorites {
            filter_favorites(&items, &favorites)
        } else {
            items
        };
        let query = CatalogQuery {
            status: args.status.clone(),
            genres: args.genres.clone(),
            sort: args.sort,
        };
        let items = query.apply(&items);
        if args.json {
            return Ok(serde_json::to_string_pretty(&items)?);
        }
        Ok(render::item_table(&items, &favorites))
    }

    async fn details(&self, id: u64, json: bool) -> Result<String, CliError> {
        let item = self
            .catalog
            .get_details(id)
            .await?
            .ok_or(CliError::NotFound(id))?;
        if json {
            return Ok(serde_json::to_string_pretty(&item)?);
        }
        let record = self.watch.get(id);
        Ok(render::item_details(&item, &record, self.favorites.is_favorite(id)))
    }

    fn favorites_action(&self, action: FavoritesAction) -> Result<String, CliError> {
        match action {
            FavoritesAction::List { json } => {
                let ids = self.favorites.list();
                if json {
                    return Ok(serde_json::to_string_pretty(&ids)?);
                }
                if ids.is_empty() {
                    return Ok("No favorites yet.".into());
                }
                Ok(ids
                    .iter()
                    .map(u64::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            FavoritesAction::Add { id } => {
                self.favorites.add(id)?;
                Ok(format!("Added {id} to favorites."))
            }
            FavoritesAction::Remove { id } => {
                self.favorites.remove(id)?;
                Ok(format!("Removed {id} from favorites."))
            }
        }
    }

    async fn status_action(&self, action: StatusAction) -> Result<String, CliError> {
        let now = self.clock.now();
        match action {
            StatusAction::Get { id, json } => {
                let record = self.watch.get(id);
                if json {
                    return Ok(serde_json::to_string_pretty(&record)?);
                }
                Ok(render::watch_record(id, &record, now))
            }
            StatusAction::Set {
                id,
                status,
                episodes,
                rating,
                notes,
            } => {
                let mut patch = WatchStatusPatch {
                    status,
                    personal_rating: rating.map(validate_rating).transpose()?,
                    notes,
                    ..Default::default()
                };
                if let Some(raw) = episodes {
                    let known = self.known_episodes(id).await?;
                    patch.episodes_watched = Some(validate_episode_input(raw, known)?);
                }
                if patch.is_empty() {
                    return Err(CliError::Usage(
                        "nothing to update: pass --status, --episodes, --rating, or --notes"
                            .into(),
                    ));
                }
                let record = self.watch.set(id, patch)?;
                Ok(render::watch_record(id, &record, now))
            }
            StatusAction::List { json } => {
                let all = self.watch.all()?;
                if json {
                    let entries: Vec<TrackedEntry<'_>> = all
                        .iter()
                        .map(|(id, record)| TrackedEntry { id: *id, record })
                        .collect();
                    return Ok(serde_json::to_string_pretty(&entries)?);
                }
                if all.is_empty() {
                    return Ok("Nothing tracked yet.".into());
                }
                Ok(all
                    .iter()
                    .map(|(id, record)| render::watch_record(*id, record, now))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
        }
    }

    /// Episode total as the catalog reports it; unknown titles are unbounded.
    async fn known_episodes(&self, id: u64) -> Result<Option<u32>, CliError> {
        match self.catalog.get_details(id).await? {
            Some(item) => Ok(item.episodes),
            None => {
                tracing::warn!(id, "Title not in catalog, episode count unchecked");
                Ok(None)
            }
        }
    }

    /// Details of every favorite, one request at a time.
    ///
    /// Titles that fail to load are skipped and returned separately.
    pub async fn favorite_items(&self) -> (Vec<CatalogItem>, Vec<u64>) {
        let ids = self.favorites.list();
        let results: Vec<(u64, Result<Option<CatalogItem>, _>)> = futures::stream::iter(ids)
            .then(|id| async move { (id, self.catalog.get_details(id).await) })
            .collect()
            .await;

        let mut items = Vec::new();
        let mut unavailable = Vec::new();
        for (id, result) in results {
            match result {
                Ok(Some(item)) => items.push(item),
                Ok(None) => unavailable.push(id),
                Err(e) => {
                    tracing::warn!(id, error = %e, "Failed to load favorite");
                    unavailable.push(id);
                }
            }
        }
        (items, unavailable)
    }

    async fn stats(&self, json: bool) -> Result<String, CliError> {
        let (items, unavailable) = self.favorite_items().await;
        let stats = CatalogStatistics::compute(&items);
        if json {
            let report = StatsReport {
                stats: &stats,
                unavailable: &unavailable,
            };
            return Ok(serde_json::to_string_pretty(&report)?);
        }
        let mut out = render::statistics(&stats);
        if !unavailable.is_empty() {
            out.push_str(&format!(
                "\n\n{} favorite(s) could not be loaded: {:?}",
                unavailable.len(),
                unavailable
            ));
        }
        Ok(out)
    }

    fn cache_action(&self, action: CacheAction) -> Result<String, CliError> {
        let cache = self.catalog.cache();
        match action {
            CacheAction::Purge => {
                let removed = cache.purge_expired()?;
                Ok(format!("Removed {removed} expired cache entries."))
            }
            CacheAction::Clear => {
                let removed = cache.clear()?;
                Ok(format!("Removed {removed} cache entries."))
            }
        }
    }
}
