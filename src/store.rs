//! Persistence seams for screenshot artifacts and snapshot documents.
//!
//! The orchestrator talks to two narrow traits: [`ObjectStore`] for the
//! cropped PNG bytes and [`DocumentStore`] for the extracted metadata.
//! The shipped implementations write to the local filesystem under a data
//! directory; an object-storage or database backend slots in behind the
//! same traits.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::path::PathBuf;
use tracing::debug;

use crate::error::StoreError;
use crate::models::SnapshotDocument;

/// Stored artifacts follow `{root}/{YYYY-MM-DD}/{short_id}_{HHMM}.png`,
/// grouping a day's captures under one prefix.
pub fn screenshot_key(root: &str, short_id: &str, display: NaiveDateTime) -> String {
    format!(
        "{root}/{}/{short_id}_{}.png",
        display.format("%Y-%m-%d"),
        display.format("%H%M"),
    )
}

/// Binary artifact storage, keyed by slash-separated object keys.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_bytes(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StoreError>;

    /// A URL a reader can fetch the object from for a limited time.
    async fn presigned_url(&self, key: &str) -> Result<String, StoreError>;

    /// All keys under the given prefix.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    async fn delete_key(&self, key: &str) -> Result<(), StoreError>;
}

/// Snapshot metadata storage.
///
/// Backends need a unique index on `(source_short_id, display_timestamp)`
/// for the upsert, plus a secondary index on `display_timestamp` for
/// date-range reads.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or overwrite the document for its
    /// `(source_short_id, display_timestamp)` key. On overwrite the
    /// original `created_at` is preserved and `updated_at` refreshed.
    async fn upsert_snapshot(&self, document: SnapshotDocument) -> Result<(), StoreError>;
}

/// Object store over a local directory. Keys map directly to relative
/// paths; presigned URLs degrade to `file://` URLs with no expiry.
pub struct FsObjectStore {
    base_dir: PathBuf,
}

impl FsObjectStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        FsObjectStore {
            base_dir: base_dir.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(key)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put_bytes(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!(key, content_type, size = bytes.len(), "stored object");
        Ok(())
    }

    async fn presigned_url(&self, key: &str) -> Result<String, StoreError> {
        let path = self.path_for(key);
        if !tokio::fs::try_exists(&path).await? {
            return Err(StoreError::Object(format!("no such object: {key}")));
        }
        Ok(format!("file://{}", path.display()))
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.base_dir.join(prefix);
        let mut keys = Vec::new();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            // An unused prefix is an empty listing, matching bucket
            // semantics.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(keys),
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                keys.push(format!("{prefix}/{}", entry.file_name().to_string_lossy()));
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn delete_key(&self, key: &str) -> Result<(), StoreError> {
        tokio::fs::remove_file(self.path_for(key)).await?;
        Ok(())
    }
}

/// Document store writing one JSON file per snapshot under a documents
/// directory. The filename encodes the upsert key.
pub struct FsDocumentStore {
    docs_dir: PathBuf,
}

impl FsDocumentStore {
    pub fn new(docs_dir: impl Into<PathBuf>) -> Self {
        FsDocumentStore {
            docs_dir: docs_dir.into(),
        }
    }

    fn path_for(&self, short_id: &str, display: NaiveDateTime) -> PathBuf {
        self.docs_dir
            .join(format!("{short_id}_{}.json", display.format("%Y%m%d%H%M")))
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn upsert_snapshot(&self, mut document: SnapshotDocument) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.docs_dir)
            .await
            .map_err(|e| StoreError::Document(e.to_string()))?;
        let path = self.path_for(&document.source_short_id, document.display_timestamp);

        if let Ok(existing) = tokio::fs::read(&path).await {
            if let Ok(previous) = serde_json::from_slice::<SnapshotDocument>(&existing) {
                document.created_at = previous.created_at;
            }
        }
        document.updated_at = Utc::now();

        let json = serde_json::to_vec_pretty(&document)
            .map_err(|e| StoreError::Document(e.to_string()))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| StoreError::Document(e.to_string()))?;
        debug!(
            source = %document.source_short_id,
            display = %document.display_timestamp,
            "upserted snapshot document"
        );
        Ok(())
    }
}

#[cfg(test)]
pub mod memory {
    //! In-memory store doubles for orchestrator tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryObjectStore {
        pub objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl ObjectStore for MemoryObjectStore {
        async fn put_bytes(
            &self,
            key: &str,
            bytes: &[u8],
            _content_type: &str,
        ) -> Result<(), StoreError> {
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), bytes.to_vec());
            Ok(())
        }

        async fn presigned_url(&self, key: &str) -> Result<String, StoreError> {
            if self.objects.lock().unwrap().contains_key(key) {
                Ok(format!("memory://{key}"))
            } else {
                Err(StoreError::Object(format!("no such object: {key}")))
            }
        }

        async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
            let mut keys: Vec<String> = self
                .objects
                .lock()
                .unwrap()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect();
            keys.sort();
            Ok(keys)
        }

        async fn delete_key(&self, key: &str) -> Result<(), StoreError> {
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct MemoryDocumentStore {
        pub documents: Mutex<HashMap<(String, NaiveDateTime), SnapshotDocument>>,
    }

    #[async_trait]
    impl DocumentStore for MemoryDocumentStore {
        async fn upsert_snapshot(&self, mut document: SnapshotDocument) -> Result<(), StoreError> {
            let key = (
                document.source_short_id.clone(),
                document.display_timestamp,
            );
            let mut documents = self.documents.lock().unwrap();
            if let Some(previous) = documents.get(&key) {
                document.created_at = previous.created_at;
            }
            document.updated_at = Utc::now();
            documents.insert(key, document);
            Ok(())
        }
    }
}
