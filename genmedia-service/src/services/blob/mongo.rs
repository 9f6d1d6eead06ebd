//! MongoDB blob backend: one document per artifact, keyed by `_id`.

use super::{BlobError, BlobStore};
use async_trait::async_trait;
use mongodb::{
    bson::{doc, spec::BinarySubtype, Binary, DateTime as BsonDateTime},
    error::{ErrorKind, WriteFailure},
    Client as MongoClient, Collection,
};
use serde::{Deserialize, Serialize};

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Serialize, Deserialize)]
struct BlobDocument {
    #[serde(rename = "_id")]
    key: String,
    data: Binary,
    size: i64,
    created_at: BsonDateTime,
}

#[derive(Clone)]
pub struct MongoBlobStore {
    client: MongoClient,
    blobs: Collection<BlobDocument>,
}

impl MongoBlobStore {
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, BlobError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            e
        })?;
        let blobs = client.database(database).collection(collection);
        tracing::info!(
            database = %database,
            collection = %collection,
            "Successfully connected to MongoDB blob collection"
        );
        Ok(Self { client, blobs })
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

#[async_trait]
impl BlobStore for MongoBlobStore {
    async fn insert(&self, key: &str, data: &[u8]) -> Result<(), BlobError> {
        let document = BlobDocument {
            key: key.to_string(),
            data: Binary {
                subtype: BinarySubtype::Generic,
                bytes: data.to_vec(),
            },
            size: data.len() as i64,
            created_at: BsonDateTime::now(),
        };

        match self.blobs.insert_one(document, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(BlobError::AlreadyExists(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError> {
        let document = self.blobs.find_one(doc! { "_id": key }, None).await?;
        Ok(document.map(|d| d.data.bytes))
    }

    async fn health_check(&self) -> Result<(), BlobError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                e
            })?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mongodb"
    }
}
