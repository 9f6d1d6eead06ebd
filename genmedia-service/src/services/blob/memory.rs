use super::{BlobError, BlobStore};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Process-local blob store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn insert(&self, key: &str, data: &[u8]) -> Result<(), BlobError> {
        match self.blobs.entry(key.to_string()) {
            Entry::Occupied(_) => Err(BlobError::AlreadyExists(key.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(data.to_vec());
                Ok(())
            }
        }
    }

    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError> {
        Ok(self.blobs.get(key).map(|blob| blob.value().clone()))
    }

    async fn health_check(&self) -> Result<(), BlobError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_refuses_to_overwrite() {
        let store = MemoryBlobStore::new();
        store.insert("k", b"first").await.unwrap();

        let second = store.insert("k", b"second").await;
        assert!(matches!(second, Err(BlobError::AlreadyExists(_))));
        assert_eq!(store.fetch("k").await.unwrap().unwrap(), b"first");
    }

    #[tokio::test]
    async fn fetch_of_missing_key_is_none() {
        let store = MemoryBlobStore::new();
        assert!(store.fetch("missing").await.unwrap().is_none());
        assert!(store.is_empty());
    }
}
