//! Conjure History — persisted, ordered, deduplicated record of past
//! requests, capped at a fixed size.

mod backend;
mod store;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use store::{HistoryStore, HISTORY_KEY, MAX_ENTRIES};
