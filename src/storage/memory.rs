//! In-process document store. Used by tests and by `STORAGE_BACKEND=memory` local runs.

use crate::storage::{overlay, Collection, Document, DocumentStore, Filter, StorageError, ID_FIELD};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
    next_id: AtomicU64,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn assign_id(&self, mut doc: Document) -> Document {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        doc.insert(ID_FIELD.to_string(), JsonValue::String(id.to_string()));
        doc
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StorageError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)))
            .cloned())
    }

    async fn insert(
        &self,
        collection: Collection,
        doc: Document,
    ) -> Result<Document, StorageError> {
        let doc = self.assign_id(doc);
        let mut collections = self.collections.write().await;
        collections.entry(collection).or_default().push(doc.clone());
        Ok(doc)
    }

    async fn upsert(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
        set_on_insert: Document,
    ) -> Result<Document, StorageError> {
        // Lookup and write happen under one write lock.
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();

        if let Some(existing) = docs.iter_mut().find(|d| filter.matches(d)) {
            for (k, v) in set {
                if k != ID_FIELD {
                    existing.insert(k, v);
                }
            }
            return Ok(existing.clone());
        }

        let doc = self.assign_id(overlay(set_on_insert, set));
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn count(&self, collection: Collection) -> Result<u64, StorageError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).map_or(0, |d| d.len() as u64))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
