mod catalog_item;
mod watch;

pub use catalog_item::{AiredRange, CatalogItem, Trailer};
pub use watch::{
    validate_episode_input, validate_rating, WatchStatus, WatchStatusPatch, WatchStatusRecord,
};
