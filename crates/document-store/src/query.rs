use serde_json::Value;

use crate::{Collection, Document, field};

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Field is present and equal to the value.
    Eq,
    /// Field is absent or different from the value.
    Ne,
}

/// A field comparison evaluated against a document body.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub path: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    /// Matches documents whose field at `path` equals `value`.
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    /// Matches documents whose field at `path` is absent or differs from `value`.
    pub fn ne(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            op: FilterOp::Ne,
            value: value.into(),
        }
    }

    /// Evaluates the filter against a document body.
    pub fn matches(&self, body: &Value) -> bool {
        let actual = field::get(body, &self.path);
        match self.op {
            FilterOp::Eq => actual == Some(&self.value),
            FilterOp::Ne => actual != Some(&self.value),
        }
    }
}

/// Builder for constructing document queries.
///
/// Results are ordered by creation time, then by identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    /// Collection to read from.
    pub collection: Collection,

    /// Filters that must all match.
    pub filters: Vec<Filter>,

    /// Maximum number of documents to return.
    pub limit: Option<usize>,

    /// Number of documents to skip.
    pub offset: Option<usize>,
}

impl DocumentQuery {
    /// Creates a query over a whole collection.
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Adds a filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds an equality filter.
    pub fn where_eq(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(path, value))
    }

    /// Sets the maximum number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of results to skip.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if every filter matches the document.
    pub fn matches(&self, document: &Document) -> bool {
        document.key.collection == self.collection
            && self.filters.iter().all(|f| f.matches(&document.body))
    }

    /// Orders matching documents and applies offset and limit.
    pub(crate) fn finish(&self, mut documents: Vec<Document>) -> Vec<Document> {
        documents.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.key.id.cmp(&b.key.id))
        });

        let offset = self.offset.unwrap_or(0);
        let documents = documents.into_iter().skip(offset);
        match self.limit {
            Some(limit) => documents.take(limit).collect(),
            None => documents.collect(),
        }
    }
}
