use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use playlink_core::ports::PreferenceStore;
use playlink_core::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

type Preferences = BTreeMap<String, String>;

/// File-based preference store.
///
/// Values are kept as a plaintext JSON object, saved credentials included.
/// Every update is a full read-modify-write under one lock, so the store
/// can be shared between tasks.
pub struct FilePreferenceStore {
    store_path: PathBuf,
    lock: Mutex<()>,
}

impl FilePreferenceStore {
    pub fn new(data_dir: PathBuf, file_name: &str) -> Self {
        Self {
            store_path: data_dir.join(file_name),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.store_path
    }

    async fn load(&self) -> Result<Preferences, Error> {
        if !fs::try_exists(&self.store_path).await.unwrap_or(false) {
            return Ok(Preferences::default());
        }

        let content = fs::read_to_string(&self.store_path).await?;
        serde_json::from_str(&content).map_err(|e| {
            Error::PreferenceStorage(format!("failed to parse preferences file: {}", e))
        })
    }

    async fn save(&self, prefs: &Preferences) -> Result<(), Error> {
        if let Some(parent) = self.store_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(prefs).map_err(|e| {
            Error::PreferenceStorage(format!("failed to serialize preferences: {}", e))
        })?;
        fs::write(&self.store_path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    #[instrument(skip(self))]
    async fn get_string(&self, key: &str) -> Result<Option<String>, Error> {
        let _lock = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    #[instrument(skip(self, value))]
    async fn set_string(&self, key: &str, value: &str) -> Result<(), Error> {
        let _lock = self.lock.lock().await;
        let mut prefs = self.load().await?;
        prefs.insert(key.to_string(), value.to_string());
        self.save(&prefs).await
    }

    #[instrument(skip(self, entries))]
    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), Error> {
        let _lock = self.lock.lock().await;
        let mut prefs = self.load().await?;
        for (key, value) in entries {
            prefs.insert(key.to_string(), value.clone());
        }
        debug!(count = entries.len(), "saving preferences");
        self.save(&prefs).await
    }

    #[instrument(skip(self))]
    async fn delete_keys(&self, keys: &[&str]) -> Result<(), Error> {
        let _lock = self.lock.lock().await;
        let mut prefs = self.load().await?;
        for key in keys {
            prefs.remove(*key);
        }
        self.save(&prefs).await
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> Result<(), Error> {
        let _lock = self.lock.lock().await;
        match fs::remove_file(&self.store_path).await {
            Ok(()) => {
                warn!(path = %self.store_path.display(), "deleted all preferences");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
