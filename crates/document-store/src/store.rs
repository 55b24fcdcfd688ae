use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use serde::de::DeserializeOwned;

use crate::{
    Collection, CommitReceipt, Document, DocumentKey, DocumentQuery, Result, WriteBatch, WriteOp,
};

/// A stream of documents.
pub type DocumentStream = Pin<Box<dyn Stream<Item = Result<Document>> + Send>>;

/// Core trait for document store implementations.
///
/// The only mutation primitive is [`DocumentStore::commit`]. Reads are not
/// isolated from concurrent commits; callers that need their read to still
/// hold at commit time attach a [`crate::Precondition`] to the write.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Commits a batch of writes.
    ///
    /// Writes are applied atomically - either all succeed or none do.
    /// Preconditions and predicate-scoped updates are evaluated against the
    /// state at commit time.
    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt>;

    /// Retrieves a single document.
    ///
    /// Returns None if the document doesn't exist.
    async fn get(&self, key: &DocumentKey) -> Result<Option<Document>>;

    /// Retrieves documents matching a query.
    async fn query(&self, query: DocumentQuery) -> Result<Vec<Document>>;

    /// Streams every document of a collection in creation order.
    async fn stream_collection(&self, collection: Collection) -> Result<DocumentStream>;
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Commits a single write.
    async fn commit_op(&self, op: WriteOp) -> Result<CommitReceipt> {
        self.commit(WriteBatch::new().with(op)).await
    }

    /// Checks if a document exists.
    async fn exists(&self, key: &DocumentKey) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Retrieves and decodes a single document.
    async fn get_decoded<T>(&self, key: &DocumentKey) -> Result<Option<(T, Document)>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            Some(document) => {
                let record = document.decode()?;
                Ok(Some((record, document)))
            }
            None => Ok(None),
        }
    }

    /// Retrieves and decodes every document matching a query.
    async fn query_decoded<T>(&self, query: DocumentQuery) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        let documents = self.query(query).await?;
        documents
            .iter()
            .map(|d| d.decode().map_err(Into::into))
            .collect()
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}
