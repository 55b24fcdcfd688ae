use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    Collection, CommitReceipt, Document, DocumentKey, DocumentQuery, DocumentStoreError, Result,
    WriteBatch,
    batch::validate_batch,
    staging::Staging,
    store::{DocumentStore, DocumentStream},
};

/// In-memory document store implementation for testing.
///
/// This implementation stores all documents in memory and provides
/// the same interface as the PostgreSQL implementation. Commits are
/// serialised behind a single write lock.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<DocumentKey, Document>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of documents stored.
    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Returns the number of documents in one collection.
    pub async fn collection_count(&self, collection: Collection) -> usize {
        self.documents
            .read()
            .await
            .keys()
            .filter(|k| k.collection == collection)
            .count()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    #[tracing::instrument(skip(self, batch), fields(ops = batch.len()))]
    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt> {
        validate_batch(&batch).map_err(|e| DocumentStoreError::InvalidBatch(e.message))?;

        let mut store = self.documents.write().await;
        let now = Utc::now();

        let changes = match Staging::new(&store, now).apply(&batch) {
            Ok(changes) => changes,
            Err(e) => {
                metrics::counter!("batch_commit_failures_total").increment(1);
                tracing::debug!(error = %e, summary = %batch.summary(), "batch rejected");
                return Err(e);
            }
        };

        let documents_written = changes.len();
        for (key, change) in changes {
            match change {
                Some(document) => {
                    store.insert(key, document);
                }
                None => {
                    store.remove(&key);
                }
            }
        }

        metrics::counter!("batch_commits_total").increment(1);
        Ok(CommitReceipt {
            committed_at: now,
            documents_written,
        })
    }

    async fn get(&self, key: &DocumentKey) -> Result<Option<Document>> {
        let store = self.documents.read().await;
        Ok(store.get(key).cloned())
    }

    async fn query(&self, query: DocumentQuery) -> Result<Vec<Document>> {
        let store = self.documents.read().await;
        let documents: Vec<Document> = store
            .values()
            .filter(|d| query.matches(d))
            .cloned()
            .collect();
        Ok(query.finish(documents))
    }

    async fn stream_collection(&self, collection: Collection) -> Result<DocumentStream> {
        use futures_util::stream;

        let documents = self.query(DocumentQuery::new(collection)).await?;
        let stream = stream::iter(documents.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }
}
