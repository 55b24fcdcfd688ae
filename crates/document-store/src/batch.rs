use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::{Collection, DocumentKey, DocumentQuery, Version, field};

/// Condition checked against a document's state at commit time.
///
/// If any precondition in a batch fails, no write in the batch is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// The document must exist.
    Exists,
    /// The document must not exist.
    Missing,
    /// The document must exist at exactly this version.
    Version(Version),
}

impl Precondition {
    /// Returns true if a document at `current` (None when absent) satisfies the condition.
    pub fn holds(&self, current: Option<Version>) -> bool {
        match (self, current) {
            (Precondition::Exists, current) => current.is_some(),
            (Precondition::Missing, current) => current.is_none(),
            (Precondition::Version(expected), Some(actual)) => *expected == actual,
            (Precondition::Version(_), None) => false,
        }
    }
}

impl std::fmt::Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precondition::Exists => write!(f, "exists"),
            Precondition::Missing => write!(f, "missing"),
            Precondition::Version(v) => write!(f, "version == {v}"),
        }
    }
}

/// New value for a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Store this JSON value.
    Value(Value),
    /// Store the batch's commit timestamp (RFC 3339).
    CommitTimestamp,
    /// Remove the field.
    Delete,
}

/// A single field-path update inside a document.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub path: String,
    pub value: FieldValue,
}

impl FieldUpdate {
    /// Sets the field at `path` to `value`.
    pub fn set(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            value: FieldValue::Value(value.into()),
        }
    }

    /// Sets the field at `path` to a serialized value.
    pub fn set_serialized<T: Serialize>(
        path: impl Into<String>,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::set(path, serde_json::to_value(value)?))
    }

    /// Sets the field at `path` to the commit timestamp.
    pub fn commit_timestamp(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: FieldValue::CommitTimestamp,
        }
    }

    /// Removes the field at `path`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: FieldValue::Delete,
        }
    }
}

/// One mutation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create or overwrite a whole document.
    Set {
        key: DocumentKey,
        body: Value,
        precondition: Option<Precondition>,
    },

    /// Update fields of an existing document.
    Update {
        key: DocumentKey,
        fields: Vec<FieldUpdate>,
        precondition: Option<Precondition>,
    },

    /// Delete a document. Deleting a missing document is a no-op.
    Delete {
        key: DocumentKey,
        precondition: Option<Precondition>,
    },

    /// Update every document matching the query's filters.
    ///
    /// The predicate is evaluated against the store state at commit time,
    /// after the ops that precede it in the batch.
    UpdateWhere {
        query: DocumentQuery,
        fields: Vec<FieldUpdate>,
    },
}

impl WriteOp {
    /// Creates a whole-document write.
    pub fn set(key: DocumentKey, body: Value) -> Self {
        WriteOp::Set {
            key,
            body,
            precondition: None,
        }
    }

    /// Creates a whole-document write from a serializable record.
    pub fn set_serialized<T: Serialize>(
        key: DocumentKey,
        record: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::set(key, serde_json::to_value(record)?))
    }

    /// Creates a field update.
    pub fn update(key: DocumentKey, fields: Vec<FieldUpdate>) -> Self {
        WriteOp::Update {
            key,
            fields,
            precondition: None,
        }
    }

    /// Creates a delete.
    pub fn delete(key: DocumentKey) -> Self {
        WriteOp::Delete {
            key,
            precondition: None,
        }
    }

    /// Creates a predicate-scoped update.
    pub fn update_where(query: DocumentQuery, fields: Vec<FieldUpdate>) -> Self {
        WriteOp::UpdateWhere { query, fields }
    }

    /// Attaches a precondition. Has no effect on `UpdateWhere`.
    pub fn when(mut self, condition: Precondition) -> Self {
        match &mut self {
            WriteOp::Set { precondition, .. }
            | WriteOp::Update { precondition, .. }
            | WriteOp::Delete { precondition, .. } => *precondition = Some(condition),
            WriteOp::UpdateWhere { .. } => {}
        }
        self
    }

    /// Returns the addressed document key, if the op targets a single document.
    pub fn key(&self) -> Option<&DocumentKey> {
        match self {
            WriteOp::Set { key, .. }
            | WriteOp::Update { key, .. }
            | WriteOp::Delete { key, .. } => Some(key),
            WriteOp::UpdateWhere { .. } => None,
        }
    }

    /// Returns the op's precondition, if any.
    pub fn precondition(&self) -> Option<Precondition> {
        match self {
            WriteOp::Set { precondition, .. }
            | WriteOp::Update { precondition, .. }
            | WriteOp::Delete { precondition, .. } => *precondition,
            WriteOp::UpdateWhere { .. } => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            WriteOp::Set { .. } => "set",
            WriteOp::Update { .. } => "update",
            WriteOp::Delete { .. } => "delete",
            WriteOp::UpdateWhere { .. } => "update_where",
        }
    }
}

/// An ordered set of writes that is applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an op, builder style.
    pub fn with(mut self, op: WriteOp) -> Self {
        self.ops.push(op);
        self
    }

    /// Appends an op.
    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    /// Returns the ops in submission order.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Returns the number of ops.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if the batch has no ops.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns every single-document key addressed by the batch.
    pub fn keys(&self) -> impl Iterator<Item = &DocumentKey> {
        self.ops.iter().filter_map(WriteOp::key)
    }

    /// Returns the collections scanned by predicate-scoped updates.
    pub fn scanned_collections(&self) -> Vec<Collection> {
        let mut collections: Vec<Collection> = self
            .ops
            .iter()
            .filter_map(|op| match op {
                WriteOp::UpdateWhere { query, .. } => Some(query.collection),
                _ => None,
            })
            .collect();
        collections.sort();
        collections.dedup();
        collections
    }

    /// Returns a short summary like `"set:1 delete:2"` for logging.
    pub fn summary(&self) -> String {
        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        for op in &self.ops {
            match counts.iter_mut().find(|(kind, _)| *kind == op.kind()) {
                Some((_, n)) => *n += 1,
                None => counts.push((op.kind(), 1)),
            }
        }
        counts
            .iter()
            .map(|(kind, n)| format!("{kind}:{n}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitReceipt {
    /// Timestamp stamped on every written document.
    pub committed_at: DateTime<Utc>,

    /// Number of documents created, modified or deleted.
    pub documents_written: usize,
}

/// Error returned when a batch is malformed.
#[derive(Debug, Clone)]
pub struct BatchValidationError {
    pub message: String,
}

impl std::fmt::Display for BatchValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Batch validation error: {}", self.message)
    }
}

impl std::error::Error for BatchValidationError {}

fn invalid(message: impl Into<String>) -> BatchValidationError {
    BatchValidationError {
        message: message.into(),
    }
}

fn validate_fields(fields: &[FieldUpdate], context: &str) -> Result<(), BatchValidationError> {
    if fields.is_empty() {
        return Err(invalid(format!("{context}: no fields to update")));
    }
    let mut seen = HashSet::new();
    for update in fields {
        if !field::is_valid_path(&update.path) {
            return Err(invalid(format!(
                "{context}: malformed field path '{}'",
                update.path
            )));
        }
        if !seen.insert(update.path.as_str()) {
            return Err(invalid(format!(
                "{context}: field '{}' updated twice",
                update.path
            )));
        }
    }
    Ok(())
}

/// Validates a batch before it is applied.
pub fn validate_batch(batch: &WriteBatch) -> Result<(), BatchValidationError> {
    if batch.is_empty() {
        return Err(invalid("Cannot commit an empty batch"));
    }

    let mut keys = HashSet::new();
    for op in batch.ops() {
        if let Some(key) = op.key() {
            if key.id.is_blank() {
                return Err(invalid(format!(
                    "Blank document id in collection {}",
                    key.collection
                )));
            }
            if !keys.insert(key) {
                return Err(invalid(format!("Document {key} written twice in one batch")));
            }
        }

        match op {
            WriteOp::Set { key, body, .. } => {
                if !body.is_object() {
                    return Err(invalid(format!("Body of {key} must be a JSON object")));
                }
            }
            WriteOp::Update { key, fields, .. } => {
                validate_fields(fields, &key.to_string())?;
            }
            WriteOp::Delete { .. } => {}
            WriteOp::UpdateWhere { query, fields } => {
                if query.filters.is_empty() {
                    return Err(invalid(format!(
                        "Predicate-scoped update on {} requires at least one filter",
                        query.collection
                    )));
                }
                validate_fields(fields, query.collection.name())?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BANNERS: Collection = Collection::new("banners");

    #[test]
    fn precondition_semantics() {
        assert!(Precondition::Exists.holds(Some(Version::first())));
        assert!(!Precondition::Exists.holds(None));
        assert!(Precondition::Missing.holds(None));
        assert!(!Precondition::Missing.holds(Some(Version::first())));
        assert!(Precondition::Version(Version::new(3)).holds(Some(Version::new(3))));
        assert!(!Precondition::Version(Version::new(3)).holds(Some(Version::new(4))));
        assert!(!Precondition::Version(Version::new(3)).holds(None));
    }

    #[test]
    fn empty_batch_is_invalid() {
        assert!(validate_batch(&WriteBatch::new()).is_err());
    }

    #[test]
    fn duplicate_keys_are_invalid() {
        let batch = WriteBatch::new()
            .with(WriteOp::set(BANNERS.key("b1"), json!({})))
            .with(WriteOp::delete(BANNERS.key("b1")));
        let err = validate_batch(&batch).unwrap_err();
        assert!(err.message.contains("written twice"));
    }

    #[test]
    fn set_body_must_be_object() {
        let batch = WriteBatch::new().with(WriteOp::set(BANNERS.key("b1"), json!([1, 2])));
        assert!(validate_batch(&batch).is_err());
    }

    #[test]
    fn malformed_paths_are_invalid() {
        let batch = WriteBatch::new().with(WriteOp::update(
            BANNERS.key("b1"),
            vec![FieldUpdate::set("a..b", true)],
        ));
        assert!(validate_batch(&batch).is_err());
    }

    #[test]
    fn unfiltered_update_where_is_invalid() {
        let batch = WriteBatch::new().with(WriteOp::update_where(
            DocumentQuery::new(BANNERS),
            vec![FieldUpdate::set("isActive", false)],
        ));
        assert!(validate_batch(&batch).is_err());
    }

    #[test]
    fn update_where_does_not_claim_a_key() {
        let batch = WriteBatch::new()
            .with(WriteOp::update_where(
                DocumentQuery::new(BANNERS).where_eq("isActive", true),
                vec![FieldUpdate::set("isActive", false)],
            ))
            .with(WriteOp::set(BANNERS.key("b1"), json!({"isActive": true})));
        assert!(validate_batch(&batch).is_ok());
        assert_eq!(batch.scanned_collections(), vec![BANNERS]);
        assert_eq!(batch.summary(), "update_where:1 set:1");
    }

    #[test]
    fn when_attaches_precondition() {
        let op = WriteOp::delete(BANNERS.key("b1")).when(Precondition::Exists);
        assert_eq!(op.precondition(), Some(Precondition::Exists));
    }
}
