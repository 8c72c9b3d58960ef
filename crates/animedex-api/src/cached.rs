//! Catalog source decorator that serves repeated queries from the response cache.

use animedex_core::cache::{keys, ResponseCache};
use animedex_core::models::CatalogItem;

use crate::error::CatalogError;
use crate::traits::CatalogSource;

/// Routes every query through a [`ResponseCache`] before hitting `source`.
///
/// Fetch errors pass through untouched; only cache writes are best-effort.
pub struct CachedCatalog<S> {
    source: S,
    cache: ResponseCache,
}

impl<S: CatalogSource> CachedCatalog<S> {
    pub fn new(source: S, cache: ResponseCache) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: CatalogSource> CatalogSource for CachedCatalog<S> {
    async fn search(&self, query: &str) -> Result<Vec<CatalogItem>, CatalogError> {
        self.cache
            .get_or_fetch(&keys::search(query), || self.source.search(query))
            .await
    }

    async fn get_details(&self, id: u64) -> Result<Option<CatalogItem>, CatalogError> {
        let key = keys::details(id);
        if let Some(hit) = self.cache.lookup::<CatalogItem>(&key) {
            return Ok(Some(hit));
        }
        // Misses are not cached, so a title that appears later is picked up.
        let item = self.source.get_details(id).await?;
        if let Some(item) = &item {
            self.cache.store(&key, item);
        }
        Ok(item)
    }

    async fn get_top(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        self.cache
            .get_or_fetch(&keys::top(), || self.source.get_top())
            .await
    }
}
