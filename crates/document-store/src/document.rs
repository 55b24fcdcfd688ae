use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::DocumentId;

/// Name of a document collection (e.g., "orders", "banners").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Collection(&'static str);

impl Collection {
    /// Creates a collection handle from its name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the collection name.
    pub const fn name(&self) -> &'static str {
        self.0
    }

    /// Returns the key of a document in this collection.
    pub fn key(&self, id: impl Into<DocumentId>) -> DocumentKey {
        DocumentKey::new(*self, id)
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of a single document: collection plus identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentKey {
    pub collection: Collection,
    pub id: DocumentId,
}

impl DocumentKey {
    /// Creates a new document key.
    pub fn new(collection: Collection, id: impl Into<DocumentId>) -> Self {
        Self {
            collection,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Write counter of a document.
///
/// A document is at version 1 after its first write and is bumped by one on
/// every write that touches it. Version 0 means "does not exist".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) of a document that does not exist.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version (1) of a freshly created document.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// A stored document with its bookkeeping metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Where the document lives.
    pub key: DocumentKey,

    /// Write counter, bumped on every committed write.
    pub version: Version,

    /// When the document was first written.
    pub created_at: DateTime<Utc>,

    /// When the document was last written.
    pub updated_at: DateTime<Utc>,

    /// The schemaless document body.
    pub body: serde_json::Value,
}

impl Document {
    /// Deserializes the body into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body.clone())
    }

    /// Returns the document identifier.
    pub fn id(&self) -> &DocumentId {
        &self.key.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS: Collection = Collection::new("orders");

    #[test]
    fn version_ordering() {
        let v1 = Version::new(1);
        let v2 = Version::new(2);
        assert!(v1 < v2);
        assert_eq!(v1.next(), v2);
        assert_eq!(Version::initial().next(), Version::first());
    }

    #[test]
    fn key_display_includes_collection() {
        let key = ORDERS.key("o-1");
        assert_eq!(key.to_string(), "orders/o-1");
        assert_eq!(key.collection.name(), "orders");
    }

    #[test]
    fn decode_body() {
        #[derive(Deserialize)]
        struct Probe {
            name: String,
        }

        let now = Utc::now();
        let doc = Document {
            key: ORDERS.key("o-1"),
            version: Version::first(),
            created_at: now,
            updated_at: now,
            body: serde_json::json!({"name": "probe"}),
        };
        let probe: Probe = doc.decode().unwrap();
        assert_eq!(probe.name, "probe");
        assert_eq!(doc.id().as_str(), "o-1");
    }
}
