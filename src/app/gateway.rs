//! The persistence gateway.
//!
//! This is the only component that talks to storage. Every write is checked against the
//! entity's rule table first; rejected records never reach the store. Accepted records are
//! reduced to their declared fields and stamped with `createdAt` / `updatedAt`.

use crate::app::error::{GatewayError, ValidationError};
use crate::domain::rules::{retain_declared_fields, validate};
use crate::storage::{Collection, Document, DocumentStore, Filter};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use tracing::debug;

pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

pub struct PersistenceGateway {
    store: Arc<dyn DocumentStore>,
}

impl PersistenceGateway {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, GatewayError> {
        Ok(self.store.find_one(collection, filter).await?)
    }

    /// Inserts a new record unconditionally.
    pub async fn insert(
        &self,
        collection: Collection,
        record: &JsonValue,
    ) -> Result<Document, GatewayError> {
        let mut doc = Self::checked(collection, record)?;
        let now = timestamp();
        doc.insert(CREATED_AT_FIELD.to_string(), JsonValue::String(now.clone()));
        doc.insert(UPDATED_AT_FIELD.to_string(), JsonValue::String(now));

        let stored = self.store.insert(collection, doc).await?;
        debug!(%collection, id = ?stored.get("_id"), "inserted document");
        Ok(stored)
    }

    /// Inserts `record` if nothing matches `key_filter`, otherwise replaces the supplied fields
    /// of the matching record. Last writer wins.
    pub async fn upsert(
        &self,
        collection: Collection,
        key_filter: &Filter,
        record: &JsonValue,
    ) -> Result<Document, GatewayError> {
        let mut set = Self::checked(collection, record)?;
        let now = timestamp();
        set.insert(UPDATED_AT_FIELD.to_string(), JsonValue::String(now.clone()));

        let mut set_on_insert = Map::new();
        set_on_insert.insert(CREATED_AT_FIELD.to_string(), JsonValue::String(now));

        let stored = self
            .store
            .upsert(collection, key_filter, set, set_on_insert)
            .await?;
        debug!(%collection, id = ?stored.get("_id"), "upserted document");
        Ok(stored)
    }

    pub async fn ping(&self) -> Result<(), GatewayError> {
        Ok(self.store.ping().await?)
    }

    fn checked(collection: Collection, record: &JsonValue) -> Result<Document, ValidationError> {
        let kind = collection.entity_kind();
        let violations = validate(kind, record);
        if !violations.is_empty() {
            return Err(ValidationError { violations });
        }
        Ok(retain_declared_fields(kind, record))
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
