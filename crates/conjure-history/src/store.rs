use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::StorageBackend;

/// Storage key the request history persists under.
pub const HISTORY_KEY: &str = "request-history";

/// Maximum number of entries kept; beyond it the least recently used drop.
pub const MAX_ENTRIES: usize = 20;

/// Persisted, ordered, deduplicated list of past requests, most recent
/// first.
///
/// Mutated only by [`record`](HistoryStore::record) and
/// [`clear`](HistoryStore::clear). A missing or corrupt payload reads as
/// an empty history, never as an error.
#[derive(Clone)]
pub struct HistoryStore {
    backend: Arc<dyn StorageBackend>,
    write_lock: Arc<Mutex<()>>,
}

impl HistoryStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// All entries, most recent first. Never fails.
    pub async fn list(&self) -> Vec<String> {
        self.load().await
    }

    /// Record a request: drop any equal entry (exact, case-sensitive
    /// match), prepend, truncate to [`MAX_ENTRIES`]. Re-recording a past
    /// request therefore moves it to the front instead of duplicating it.
    /// Returns the updated list.
    pub async fn record(&self, request: &str) -> Vec<String> {
        // read-modify-write under one lock; one pipeline run at a time
        // holds it long enough to keep the sequence consistent
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await;
        entries.retain(|e| e != request);
        entries.insert(0, request.to_string());
        entries.truncate(MAX_ENTRIES);

        self.persist(&entries).await;
        entries
    }

    /// Remove all entries. Irreversible; never fails.
    pub async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.backend.remove(HISTORY_KEY).await {
            warn!(error = %e, "Failed to remove persisted history");
        }
    }

    async fn load(&self) -> Vec<String> {
        let Some(raw) = self.backend.get(HISTORY_KEY).await else {
            return Vec::new();
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(error = %e, "Persisted history is not valid JSON, treating as empty");
                Vec::new()
            }
        }
    }

    async fn persist(&self, entries: &[String]) {
        let payload = match serde_json::to_string(entries) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to encode history");
                return;
            }
        };

        if let Err(e) = self.backend.set(HISTORY_KEY, &payload).await {
            warn!(error = %e, "Failed to persist history");
        }
    }
}
