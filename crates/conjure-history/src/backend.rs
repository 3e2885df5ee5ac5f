use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

/// Durable key-value storage the history store writes through.
///
/// Injected so tests can substitute an in-memory backend without touching
/// real persisted state.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Value for the key, or `None` when absent or unreadable.
    async fn get(&self, key: &str) -> Option<String>;

    /// Persist a value under the key.
    async fn set(&self, key: &str, value: &str) -> std::io::Result<()>;

    /// Remove the key. Removing an absent key is fine.
    async fn remove(&self, key: &str) -> std::io::Result<()>;
}

/// One `<key>.json` file per key under a directory.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn get(&self, key: &str) -> Option<String> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "No readable value for key");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        // Write then rename so a crash mid-write never leaves a torn value.
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, self.path_for(key)).await
    }

    async fn remove(&self, key: &str) -> std::io::Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// In-memory backend for tests.
#[derive(Default)]
pub struct MemoryBackend {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Option<String> {
        self.values.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> std::io::Result<()> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}
