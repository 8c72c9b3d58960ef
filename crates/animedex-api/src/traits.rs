//! The catalog seam: anything that can search, look up, and rank titles.
//!
//! [`JikanClient`](crate::JikanClient) talks to the network;
//! [`CachedCatalog`](crate::CachedCatalog) wraps any source with the
//! response cache.

use std::future::Future;

use animedex_core::models::CatalogItem;

use crate::error::CatalogError;

pub trait CatalogSource: Send + Sync {
    /// Search titles by free text.
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<CatalogItem>, CatalogError>> + Send;

    /// Look up one title. `None` when the catalog has no such id.
    fn get_details(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<Option<CatalogItem>, CatalogError>> + Send;

    /// The top-ranked titles.
    fn get_top(&self) -> impl Future<Output = Result<Vec<CatalogItem>, CatalogError>> + Send;
}
