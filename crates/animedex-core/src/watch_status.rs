//! Per-title tracking records, stored under `anime_status_<id>`.
//!
//! The store does no validation of its own; callers check input with
//! [`WatchStatusPatch::validate`](crate::models::WatchStatusPatch::validate)
//! before writing. Records are never deleted.

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::AnimedexError;
use crate::kv::SharedStore;
use crate::models::{WatchStatusPatch, WatchStatusRecord};

pub const WATCH_STATUS_PREFIX: &str = "anime_status_";

#[derive(Clone)]
pub struct WatchStatusStore {
    store: SharedStore,
    clock: Arc<dyn Clock>,
}

impl WatchStatusStore {
    pub fn with_clock(store: SharedStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn key(id: u64) -> String {
        format!("{WATCH_STATUS_PREFIX}{id}")
    }

    /// The stored record for `id`, or a fresh default one.
    ///
    /// Unreadable state is logged and reads as the default.
    pub fn get(&self, id: u64) -> WatchStatusRecord {
        match self.load(id) {
            Ok(Some(record)) => record,
            Ok(None) => WatchStatusRecord::new_default(self.clock.now()),
            Err(e) => {
                tracing::warn!(anime_id = id, error = %e, "Error loading watch status");
                WatchStatusRecord::new_default(self.clock.now())
            }
        }
    }

    /// Merge `patch` into the current record, stamp it, persist, and return it.
    pub fn set(&self, id: u64, patch: WatchStatusPatch) -> Result<WatchStatusRecord, AnimedexError> {
        let mut record = self.get(id);
        record.apply(patch, self.clock.now());
        self.store
            .set(&Self::key(id), &serde_json::to_string(&record)?)?;
        tracing::debug!(anime_id = id, status = %record.status, "watch status saved");
        Ok(record)
    }

    /// Every stored record, ordered by id.
    pub fn all(&self) -> Result<Vec<(u64, WatchStatusRecord)>, AnimedexError> {
        let mut records = Vec::new();
        for key in self.store.keys_with_prefix(WATCH_STATUS_PREFIX)? {
            let Some(id) = key
                .strip_prefix(WATCH_STATUS_PREFIX)
                .and_then(|s| s.parse::<u64>().ok())
            else {
                continue;
            };
            match self.load(id) {
                Ok(Some(record)) => records.push((id, record)),
                Ok(None) => {}
                Err(e) => tracing::warn!(anime_id = id, error = %e, "Skipping unreadable watch status"),
            }
        }
        records.sort_by_key(|(id, _)| *id);
        Ok(records)
    }

    fn load(&self, id: u64) -> Result<Option<WatchStatusRecord>, AnimedexError> {
        match self.store.get(&Self::key(id))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}
