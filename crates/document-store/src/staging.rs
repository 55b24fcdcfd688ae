//! Applies a batch to a snapshot of the touched documents without mutating it.
//!
//! Both backends load the documents a batch can touch, stage the batch here,
//! and only then persist the resulting change set. A failure anywhere in
//! staging leaves the backing state untouched.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    Collection, Document, DocumentKey, DocumentStoreError, FieldUpdate, FieldValue, Result,
    Version, WriteBatch, WriteOp, field,
};

/// Final state of every document changed by a batch; `None` means deleted.
pub(crate) type ChangeSet = BTreeMap<DocumentKey, Option<Document>>;

pub(crate) struct Staging<'a> {
    base: &'a HashMap<DocumentKey, Document>,
    changes: ChangeSet,
    now: DateTime<Utc>,
}

impl<'a> Staging<'a> {
    pub(crate) fn new(base: &'a HashMap<DocumentKey, Document>, now: DateTime<Utc>) -> Self {
        Self {
            base,
            changes: BTreeMap::new(),
            now,
        }
    }

    /// Stages every op in order, returning the change set.
    pub(crate) fn apply(mut self, batch: &WriteBatch) -> Result<ChangeSet> {
        for op in batch.ops() {
            self.apply_op(op)?;
        }
        Ok(self.changes)
    }

    fn current(&self, key: &DocumentKey) -> Option<&Document> {
        match self.changes.get(key) {
            Some(change) => change.as_ref(),
            None => self.base.get(key),
        }
    }

    fn check(&self, key: &DocumentKey, precondition: Option<crate::Precondition>) -> Result<()> {
        let Some(precondition) = precondition else {
            return Ok(());
        };
        let actual = self.current(key).map(|d| d.version);
        if precondition.holds(actual) {
            Ok(())
        } else {
            Err(DocumentStoreError::PreconditionFailed {
                key: key.clone(),
                precondition,
                actual,
            })
        }
    }

    fn apply_op(&mut self, op: &WriteOp) -> Result<()> {
        match op {
            WriteOp::Set {
                key,
                body,
                precondition,
            } => {
                self.check(key, *precondition)?;
                let document = match self.current(key) {
                    Some(existing) => Document {
                        key: key.clone(),
                        version: existing.version.next(),
                        created_at: existing.created_at,
                        updated_at: self.now,
                        body: body.clone(),
                    },
                    None => Document {
                        key: key.clone(),
                        version: Version::first(),
                        created_at: self.now,
                        updated_at: self.now,
                        body: body.clone(),
                    },
                };
                self.changes.insert(key.clone(), Some(document));
            }
            WriteOp::Update {
                key,
                fields,
                precondition,
            } => {
                self.check(key, *precondition)?;
                let existing = self
                    .current(key)
                    .cloned()
                    .ok_or_else(|| DocumentStoreError::NotFound(key.clone()))?;
                let updated = self.update_document(existing, fields)?;
                self.changes.insert(key.clone(), Some(updated));
            }
            WriteOp::Delete { key, precondition } => {
                self.check(key, *precondition)?;
                if self.current(key).is_some() {
                    self.changes.insert(key.clone(), None);
                }
            }
            WriteOp::UpdateWhere { query, fields } => {
                let matching: Vec<Document> = self
                    .visible(query.collection)
                    .into_iter()
                    .filter(|d| query.matches(d))
                    .collect();
                for document in matching {
                    let key = document.key.clone();
                    let updated = self.update_document(document, fields)?;
                    self.changes.insert(key, Some(updated));
                }
            }
        }
        Ok(())
    }

    /// Every live document of a collection as seen by the batch so far.
    fn visible(&self, collection: Collection) -> Vec<Document> {
        let mut documents: BTreeMap<&DocumentKey, &Document> = self
            .base
            .iter()
            .filter(|(key, _)| key.collection == collection)
            .collect();
        for (key, change) in &self.changes {
            if key.collection != collection {
                continue;
            }
            match change {
                Some(document) => {
                    documents.insert(key, document);
                }
                None => {
                    documents.remove(key);
                }
            }
        }
        documents.into_values().cloned().collect()
    }

    fn update_document(&self, mut document: Document, fields: &[FieldUpdate]) -> Result<Document> {
        for update in fields {
            let applied = match &update.value {
                FieldValue::Value(value) => {
                    field::set(&mut document.body, &update.path, value.clone())
                }
                FieldValue::CommitTimestamp => field::set(
                    &mut document.body,
                    &update.path,
                    Value::String(self.now.to_rfc3339()),
                ),
                FieldValue::Delete => {
                    field::remove(&mut document.body, &update.path);
                    true
                }
            };
            if !applied {
                return Err(DocumentStoreError::FieldTypeMismatch {
                    key: document.key.clone(),
                    path: update.path.clone(),
                });
            }
        }
        document.version = document.version.next();
        document.updated_at = self.now;
        Ok(document)
    }
}
