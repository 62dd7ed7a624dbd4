use std::time::Duration;

use bson::Document;
use mongodb::{Collection, Database};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::time::timeout;

/// Bound on every store round-trip. A hung connection must not pin a
/// webhook task forever.
const OP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("bson serialization error: {0}")]
    BsonSer(#[from] bson::ser::Error),
    #[error("store operation on `{0}` timed out")]
    Timeout(&'static str),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Thin typed wrapper around a MongoDB collection. Every operation runs
/// under [`OP_TIMEOUT`].
pub struct BaseDao<T: Send + Sync> {
    collection: Collection<T>,
    name: &'static str,
}

impl<T> BaseDao<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(db: &Database, name: &'static str) -> Self {
        Self {
            collection: db.collection(name),
            name,
        }
    }

    pub fn collection(&self) -> &Collection<T> {
        &self.collection
    }

    pub async fn insert_one(&self, item: &T) -> StoreResult<()> {
        timeout(OP_TIMEOUT, self.collection.insert_one(item))
            .await
            .map_err(|_| StoreError::Timeout(self.name))??;
        Ok(())
    }

    pub async fn find_one(&self, filter: Document) -> StoreResult<Option<T>> {
        let found = timeout(OP_TIMEOUT, self.collection.find_one(filter))
            .await
            .map_err(|_| StoreError::Timeout(self.name))??;
        Ok(found)
    }

    /// Returns the matched-row count; 0 means nothing to update, which
    /// callers treat as a no-op rather than an error.
    pub async fn update_many(&self, filter: Document, update: Document) -> StoreResult<u64> {
        let result = timeout(OP_TIMEOUT, self.collection.update_many(filter, update))
            .await
            .map_err(|_| StoreError::Timeout(self.name))??;
        Ok(result.matched_count)
    }

    pub async fn hard_delete(&self, filter: Document) -> StoreResult<u64> {
        let result = timeout(OP_TIMEOUT, self.collection.delete_many(filter))
            .await
            .map_err(|_| StoreError::Timeout(self.name))??;
        Ok(result.deleted_count)
    }
}
