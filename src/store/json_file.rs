use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::{StoreBackend, StoreError, SubscriberDocument};

/// Keeps the subscriber document in a single JSON file on disk.
///
/// Writes go to a sibling `*.tmp` file which is synced and then renamed over
/// the target, so readers only ever see a complete document.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: PathBuf) -> JsonFileBackend {
        JsonFileBackend { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| OsString::from("subscribers.json"));
        file_name.push(".tmp");

        self.path.with_file_name(file_name)
    }
}

#[async_trait]
impl StoreBackend for JsonFileBackend {
    async fn read(&self) -> Result<Option<SubscriberDocument>, StoreError> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(serde_json::from_slice(&contents)?))
    }

    async fn write(&self, document: &SubscriberDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_vec_pretty(document)?;
        let temp_path = self.temp_path();

        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp_path, &self.path).await?;

        Ok(())
    }
}
