pub mod cached;
pub mod error;
pub mod jikan;
pub mod rate_limit;
pub mod traits;

pub use cached::CachedCatalog;
pub use error::CatalogError;
pub use jikan::JikanClient;
pub use traits::CatalogSource;
