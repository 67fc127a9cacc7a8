use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Upper bound on a single uploaded artifact.
pub const MAX_ARTIFACT_BYTES: usize = 25 * 1024 * 1024;

/// Errors surfaced by blob stores.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BlobError {
    #[error("artifact already exists at {path}")]
    AlreadyExists { path: String },

    #[error("artifact rejected: {reason}")]
    Rejected { reason: String },

    #[error("blob i/o error: {0}")]
    Io(String),
}

/// Write-once artifact storage.
///
/// Paths are relative, user-scoped keys (`<user_id>/<millis>.<ext>`).
/// Overwriting an existing key is never permitted.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a new key.
    ///
    /// # Errors
    ///
    /// Returns `BlobError::AlreadyExists` if the key is taken,
    /// `BlobError::Rejected` for payloads the store refuses (empty, over
    /// the size cap, malformed key), and `BlobError::Io` otherwise.
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), BlobError>;
}

fn validate(path: &str, bytes: &[u8]) -> Result<(), BlobError> {
    if path.is_empty() || path.starts_with('/') || path.split('/').any(|seg| seg == "..") {
        return Err(BlobError::Rejected {
            reason: format!("invalid artifact key: {path}"),
        });
    }
    if bytes.is_empty() {
        return Err(BlobError::Rejected {
            reason: "empty upload".into(),
        });
    }
    if bytes.len() > MAX_ARTIFACT_BYTES {
        return Err(BlobError::Rejected {
            reason: format!("upload of {} bytes exceeds cap", bytes.len()),
        });
    }
    Ok(())
}

/// Blob store backed by a directory on the local filesystem.
#[derive(Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), BlobError> {
        validate(path, bytes)?;

        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BlobError::Io(e.to_string()))?;
        }

        // create_new keeps the no-overwrite contract at the filesystem level.
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => BlobError::AlreadyExists {
                    path: path.to_string(),
                },
                _ => BlobError::Io(e.to_string()),
            })?;

        file.write_all(bytes)
            .await
            .map_err(|e| BlobError::Io(e.to_string()))?;
        file.flush().await.map_err(|e| BlobError::Io(e.to_string()))?;
        Ok(())
    }
}

/// In-memory blob store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a key holds an object.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.objects
            .lock()
            .map(|objects| objects.contains_key(path))
            .unwrap_or(false)
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), BlobError> {
        validate(path, bytes)?;
        let mut objects = self
            .objects
            .lock()
            .map_err(|e| BlobError::Io(e.to_string()))?;
        if objects.contains_key(path) {
            return Err(BlobError::AlreadyExists {
                path: path.to_string(),
            });
        }
        objects.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_put_then_duplicate_conflicts() {
        let store = InMemoryBlobStore::new();
        store.put("user/1.wav", b"abc").await.unwrap();
        assert!(store.contains("user/1.wav"));

        let err = store.put("user/1.wav", b"abc").await.unwrap_err();
        assert!(matches!(err, BlobError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn empty_payload_is_rejected() {
        let store = InMemoryBlobStore::new();
        let err = store.put("user/1.wav", b"").await.unwrap_err();
        assert!(matches!(err, BlobError::Rejected { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let store = InMemoryBlobStore::new();
        for key in ["/etc/passwd", "../up.wav", "user/../../up.wav", ""] {
            let err = store.put(key, b"abc").await.unwrap_err();
            assert!(matches!(err, BlobError::Rejected { .. }), "key {key:?}");
        }
    }

    #[tokio::test]
    async fn fs_store_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        store.put("user/1.wav", b"audio-bytes").await.unwrap();
        let written = std::fs::read(dir.path().join("user/1.wav")).unwrap();
        assert_eq!(written, b"audio-bytes");

        let err = store.put("user/1.wav", b"other").await.unwrap_err();
        assert!(matches!(err, BlobError::AlreadyExists { .. }));

        // The original object is untouched by the failed overwrite.
        let still = std::fs::read(dir.path().join("user/1.wav")).unwrap();
        assert_eq!(still, b"audio-bytes");
    }
}
