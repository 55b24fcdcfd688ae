use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    Collection, CommitReceipt, Document, DocumentKey, DocumentQuery, DocumentStoreError, FilterOp,
    Precondition, Result, Version, WriteBatch,
    batch::validate_batch,
    staging::Staging,
    store::{DocumentStore, DocumentStream},
};

const SELECT_COLUMNS: &str =
    "SELECT collection, id, version, created_at, updated_at, body FROM documents";

/// PostgreSQL-backed document store implementation.
///
/// Each commit runs in one transaction: touched rows are locked with
/// `SELECT ... FOR UPDATE`, collections scanned by predicate-scoped updates
/// are serialised with a transaction-scoped advisory lock, the batch is
/// staged in memory, and the resulting change set is written back.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_document(collection: Collection, row: PgRow) -> Result<Document> {
        Ok(Document {
            key: DocumentKey::new(collection, row.try_get::<String, _>("id")?),
            version: Version::new(row.try_get("version")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            body: row.try_get("body")?,
        })
    }

    async fn lock_key(
        tx: &mut Transaction<'_, Postgres>,
        key: &DocumentKey,
    ) -> Result<Option<Document>> {
        let sql = format!("{SELECT_COLUMNS} WHERE collection = $1 AND id = $2 FOR UPDATE");
        let row: Option<PgRow> = sqlx::query(&sql)
            .bind(key.collection.name())
            .bind(key.id.as_str())
            .fetch_optional(&mut **tx)
            .await?;

        row.map(|r| Self::row_to_document(key.collection, r))
            .transpose()
    }

    async fn lock_collection(
        tx: &mut Transaction<'_, Postgres>,
        collection: Collection,
    ) -> Result<Vec<Document>> {
        // Rows inserted by a concurrent commit would not be seen by the
        // FOR UPDATE scan alone.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(collection.name())
            .execute(&mut **tx)
            .await?;

        let sql = format!("{SELECT_COLUMNS} WHERE collection = $1 ORDER BY id FOR UPDATE");
        let rows = sqlx::query(&sql)
            .bind(collection.name())
            .fetch_all(&mut **tx)
            .await?;

        rows.into_iter()
            .map(|r| Self::row_to_document(collection, r))
            .collect()
    }

    async fn write_document(
        tx: &mut Transaction<'_, Postgres>,
        document: &Document,
        existed: bool,
    ) -> Result<()> {
        let statement = if existed {
            r#"
            UPDATE documents
            SET version = $3, created_at = $4, updated_at = $5, body = $6
            WHERE collection = $1 AND id = $2
            "#
        } else {
            // Plain INSERT: a concurrent creator trips the primary key instead
            // of being silently overwritten.
            r#"
            INSERT INTO documents (collection, id, version, created_at, updated_at, body)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#
        };

        sqlx::query(statement)
            .bind(document.key.collection.name())
            .bind(document.key.id.as_str())
            .bind(document.version.as_i64())
            .bind(document.created_at)
            .bind(document.updated_at)
            .bind(&document.body)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("documents_pkey")
                {
                    return DocumentStoreError::PreconditionFailed {
                        key: document.key.clone(),
                        precondition: Precondition::Missing,
                        actual: Some(Version::first()),
                    };
                }
                DocumentStoreError::Database(e)
            })?;

        Ok(())
    }

    async fn commit_in_tx(&self, batch: &WriteBatch) -> Result<CommitReceipt> {
        let mut tx = self.pool.begin().await?;

        let mut base: HashMap<DocumentKey, Document> = HashMap::new();
        for collection in batch.scanned_collections() {
            for document in Self::lock_collection(&mut tx, collection).await? {
                base.insert(document.key.clone(), document);
            }
        }
        for key in batch.keys() {
            if base.contains_key(key) {
                continue;
            }
            if let Some(document) = Self::lock_key(&mut tx, key).await? {
                base.insert(key.clone(), document);
            }
        }

        let now = Utc::now();
        let changes = Staging::new(&base, now).apply(batch)?;

        let documents_written = changes.len();
        for (key, change) in &changes {
            match change {
                Some(document) => {
                    Self::write_document(&mut tx, document, base.contains_key(key)).await?;
                }
                None => {
                    sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                        .bind(key.collection.name())
                        .bind(key.id.as_str())
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(CommitReceipt {
            committed_at: now,
            documents_written,
        })
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[tracing::instrument(skip(self, batch), fields(ops = batch.len()))]
    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt> {
        validate_batch(&batch).map_err(|e| DocumentStoreError::InvalidBatch(e.message))?;

        // Dropping the transaction on an error path rolls it back.
        match self.commit_in_tx(&batch).await {
            Ok(receipt) => {
                metrics::counter!("batch_commits_total").increment(1);
                Ok(receipt)
            }
            Err(e) => {
                metrics::counter!("batch_commit_failures_total").increment(1);
                tracing::debug!(error = %e, summary = %batch.summary(), "batch rejected");
                Err(e)
            }
        }
    }

    async fn get(&self, key: &DocumentKey) -> Result<Option<Document>> {
        let sql = format!("{SELECT_COLUMNS} WHERE collection = $1 AND id = $2");
        let row: Option<PgRow> = sqlx::query(&sql)
            .bind(key.collection.name())
            .bind(key.id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_document(key.collection, r))
            .transpose()
    }

    async fn query(&self, query: DocumentQuery) -> Result<Vec<Document>> {
        // Equality filters are pushed down as JSONB containment; the full
        // filter set is re-checked in memory before paging.
        let mut containment = serde_json::Value::Object(serde_json::Map::new());
        for filter in query.filters.iter().filter(|f| f.op == FilterOp::Eq) {
            crate::field::set(&mut containment, &filter.path, filter.value.clone());
        }

        let sql = format!(
            "{SELECT_COLUMNS} WHERE collection = $1 AND body @> $2 ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(query.collection.name())
            .bind(&containment)
            .fetch_all(&self.pool)
            .await?;

        let documents = rows
            .into_iter()
            .map(|r| Self::row_to_document(query.collection, r))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter(|d| query.matches(d))
            .collect();

        Ok(query.finish(documents))
    }

    async fn stream_collection(&self, collection: Collection) -> Result<DocumentStream> {
        use futures_util::stream;

        // Materialised so the stream does not borrow the pool.
        let documents = self.query(DocumentQuery::new(collection)).await?;
        Ok(Box::pin(stream::iter(documents.into_iter().map(Ok))))
    }
}
