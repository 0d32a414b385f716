//! Document storage: the driver seam behind the persistence gateway.
//!
//! A store keeps three independent collections of JSON documents. Each stored document carries
//! a store-assigned `_id`. Stores provide per-operation atomicity only.

use crate::domain::EntityKind;
use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use std::fmt;

pub mod filter;
pub mod memory;
pub mod postgres;

pub use filter::{Condition, Filter};
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// A stored JSON document (always an object).
pub type Document = Map<String, JsonValue>;

/// Field holding the store-assigned document id.
pub const ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Bookings,
    ContactMessages,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Users,
        Collection::Bookings,
        Collection::ContactMessages,
    ];

    /// Table / collection name in the backing store.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Bookings => "bookings",
            Collection::ContactMessages => "contact_messages",
        }
    }

    /// Entity kind whose rules guard writes to this collection.
    pub fn entity_kind(self) -> EntityKind {
        match self {
            Collection::Users => EntityKind::Profile,
            Collection::Bookings => EntityKind::Booking,
            Collection::ContactMessages => EntityKind::ContactMessage,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("corrupt document in {collection}: {reason}")]
    Corrupt {
        collection: Collection,
        reason: String,
    },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Contract every storage backend implements.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates collections / indexes if they do not exist yet.
    async fn ensure_collections(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Returns the first document (in insertion order) matching `filter`.
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StorageError>;

    /// Inserts `doc` as a new document and returns it with its `_id`.
    async fn insert(&self, collection: Collection, doc: Document)
        -> Result<Document, StorageError>;

    /// Merges `set` into the first document matching `filter`. When nothing matches, inserts
    /// `set_on_insert` overlaid with `set`. Returns the post-write document.
    async fn upsert(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
        set_on_insert: Document,
    ) -> Result<Document, StorageError>;

    async fn count(&self, collection: Collection) -> Result<u64, StorageError>;

    /// Connectivity probe.
    async fn ping(&self) -> Result<(), StorageError>;
}

/// `base` overlaid with `top` (fields in `top` win).
pub(crate) fn overlay(mut base: Document, top: Document) -> Document {
    for (k, v) in top {
        base.insert(k, v);
    }
    base
}
