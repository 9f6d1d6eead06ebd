//! Key/value blob backends behind the artifact store.
//!
//! Backends only move bytes. Key naming, empty-payload handling and the
//! not-found/failure split live in [`crate::services::ArtifactStore`].

pub mod local;
pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use thiserror::Error;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
pub use mongo::MongoBlobStore;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key`. Never overwrites: an existing key yields
    /// [`BlobError::AlreadyExists`].
    async fn insert(&self, key: &str, data: &[u8]) -> Result<(), BlobError>;

    /// Bytes stored under `key`, or `None` when absent.
    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError>;

    async fn health_check(&self) -> Result<(), BlobError>;

    fn name(&self) -> &'static str;
}
