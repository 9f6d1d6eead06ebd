use super::{BlobError, BlobStore};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Blobs as flat files under `base_path`, one file per key.
///
/// Keys reaching this backend are single path segments; the artifact store
/// rejects anything else before it gets here.
pub struct LocalBlobStore {
    base_path: PathBuf,
}

impl LocalBlobStore {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn insert(&self, key: &str, data: &[u8]) -> Result<(), BlobError> {
        let path = self.base_path.join(key);
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(BlobError::AlreadyExists(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let written = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            // Leave no truncated blob behind.
            let _ = fs::remove_file(&path).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError> {
        match fs::read(self.base_path.join(key)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn health_check(&self) -> Result<(), BlobError> {
        let metadata = fs::metadata(&self.base_path).await?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(BlobError::Io(std::io::Error::other(format!(
                "{} is not a directory",
                self.base_path.display()
            ))))
        }
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("genmedia-blob-{}", rand::random::<u64>()))
    }

    #[tokio::test]
    async fn insert_then_fetch_returns_same_bytes() {
        let dir = temp_dir();
        let store = LocalBlobStore::new(&dir).await.unwrap();

        store.insert("anon_fox_1.png", b"\x89PNG").await.unwrap();
        let data = store.fetch("anon_fox_1.png").await.unwrap();
        assert_eq!(data.as_deref(), Some(&b"\x89PNG"[..]));

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn existing_file_is_not_overwritten() {
        let dir = temp_dir();
        let store = LocalBlobStore::new(&dir).await.unwrap();

        store.insert("k.png", b"one").await.unwrap();
        let result = store.insert("k.png", b"two").await;
        assert!(matches!(result, Err(BlobError::AlreadyExists(_))));
        assert_eq!(store.fetch("k.png").await.unwrap().unwrap(), b"one");

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn missing_file_is_none_and_dir_is_healthy() {
        let dir = temp_dir();
        let store = LocalBlobStore::new(&dir).await.unwrap();

        assert!(store.fetch("nope.png").await.unwrap().is_none());
        assert!(store.health_check().await.is_ok());

        let _ = fs::remove_dir_all(&dir).await;
    }
}
