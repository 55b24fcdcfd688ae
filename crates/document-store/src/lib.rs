pub mod batch;
pub mod document;
pub mod error;
pub mod field;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

mod staging;

pub use batch::{CommitReceipt, FieldUpdate, FieldValue, Precondition, WriteBatch, WriteOp};
pub use common::DocumentId;
pub use document::{Collection, Document, DocumentKey, Version};
pub use error::{DocumentStoreError, Result};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use query::{DocumentQuery, Filter, FilterOp};
pub use store::{DocumentStore, DocumentStoreExt, DocumentStream};
