use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::blobs::{BlobStream, ObjectStore, StorageError};

/// [`ObjectStore`] keeping each blob as a file under `root`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalObjectStore { root: root.into() }
    }

    /// Resolves a key to a path strictly inside `root`.
    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let well_formed = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !well_formed {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<BlobStream, StorageError> {
        let path = self.path_for(key)?;
        match fs::File::open(&path).await {
            Ok(file) => Ok(ReaderStream::new(file).boxed()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;

    use super::*;

    async fn read_all(stream: BlobStream) -> Vec<u8> {
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        chunks.concat()
    }

    #[tokio::test]
    async fn test_put_then_get_streams_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store
            .put("app-1/ada_resume_cv.pdf", Bytes::from_static(b"%PDF-1.7"))
            .await
            .unwrap();

        let body = read_all(store.get("app-1/ada_resume_cv.pdf").await.unwrap()).await;
        assert_eq!(body, b"%PDF-1.7");
        assert!(dir.path().join("app-1/ada_resume_cv.pdf").is_file());
    }

    #[tokio::test]
    async fn test_put_is_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store.put("k.txt", Bytes::from_static(b"one")).await.unwrap();
        let err = store.put("k.txt", Bytes::from_static(b"two")).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));

        let body = read_all(store.get("k.txt").await.unwrap()).await;
        assert_eq!(body, b"one");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        assert!(matches!(
            store.get("nope.pdf").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store.put("a/b.pdf", Bytes::from_static(b"x")).await.unwrap();
        store.delete("a/b.pdf").await.unwrap();
        assert!(!dir.path().join("a/b.pdf").exists());

        store.delete("a/b.pdf").await.unwrap();
    }

    #[tokio::test]
    async fn test_keys_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path().join("uploads"));

        for key in ["../secret", "/etc/passwd", "a/../../b", ""] {
            assert!(
                matches!(
                    store.put(key, Bytes::from_static(b"x")).await,
                    Err(StorageError::InvalidKey(_))
                ),
                "key {key:?} should be rejected"
            );
        }
    }
}
