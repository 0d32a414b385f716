//! Persistent document store implementation using PostgreSQL.
//!
//! Each collection is a table of JSONB documents:
//! `(id BIGSERIAL PRIMARY KEY, doc JSONB NOT NULL)`. The `_id` exposed to callers is the
//! `id` column rendered as a string; it is never stored inside `doc`.

use crate::storage::{
    overlay, Collection, Condition, Document, DocumentStore, Filter, StorageError, ID_FIELD,
};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, info};

/// A document store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!(max_connections, "connected to PostgreSQL");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_document(collection: Collection, row: &PgRow) -> Result<Document, StorageError> {
        let id: i64 = row.try_get("id")?;
        let doc: JsonValue = row.try_get("doc")?;
        let JsonValue::Object(mut doc) = doc else {
            return Err(StorageError::Corrupt {
                collection,
                reason: format!("row {} is not a JSON object", id),
            });
        };
        doc.insert(ID_FIELD.to_string(), JsonValue::String(id.to_string()));
        Ok(doc)
    }
}

/// Appends `WHERE ...` for `filter` to `qb`.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    for (i, condition) in filter.conditions().iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        let (field, value, op) = match condition {
            Condition::Eq { field, value } => (field, value, " = "),
            Condition::Ne { field, value } => (field, value, " IS DISTINCT FROM "),
        };
        // Literal key so lookups can use the `(doc ->> '<field>')` expression indexes.
        qb.push(format!("(doc ->> {})", quote_literal(field)))
            .push(op)
            .push_bind(value.clone());
    }
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn ensure_collections(&self) -> Result<(), StorageError> {
        for collection in Collection::ALL {
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id BIGSERIAL PRIMARY KEY,
                    doc JSONB NOT NULL
                )",
                collection.name()
            ))
            .execute(&self.pool)
            .await?;
        }

        // Lookup indexes only; username uniqueness is checked by the profile handler.
        sqlx::query("CREATE INDEX IF NOT EXISTS users_auth0_id_idx ON users ((doc ->> 'auth0Id'))")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS users_username_idx ON users ((doc ->> 'username'))")
            .execute(&self.pool)
            .await?;

        debug!("document tables ensured");
        Ok(())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StorageError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT id, doc FROM {}", collection));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY id LIMIT 1");

        let row = qb.build().fetch_optional(&self.pool).await?;
        row.map(|r| Self::row_to_document(collection, &r)).transpose()
    }

    async fn insert(
        &self,
        collection: Collection,
        mut doc: Document,
    ) -> Result<Document, StorageError> {
        doc.remove(ID_FIELD);
        let row = sqlx::query(&format!(
            "INSERT INTO {} (doc) VALUES ($1) RETURNING id, doc",
            collection
        ))
        .bind(JsonValue::Object(doc))
        .fetch_one(&self.pool)
        .await?;
        Self::row_to_document(collection, &row)
    }

    async fn upsert(
        &self,
        collection: Collection,
        filter: &Filter,
        mut set: Document,
        set_on_insert: Document,
    ) -> Result<Document, StorageError> {
        set.remove(ID_FIELD);

        // Update the oldest matching document in place; `||` replaces supplied keys only.
        let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET doc = doc || ", collection));
        qb.push_bind(JsonValue::Object(set.clone()));
        qb.push(format!(" WHERE id = (SELECT id FROM {}", collection));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY id LIMIT 1 FOR UPDATE) RETURNING id, doc");

        if let Some(row) = qb.build().fetch_optional(&self.pool).await? {
            return Self::row_to_document(collection, &row);
        }

        // Two concurrent first writes for the same key can both land here.
        self.insert(collection, overlay(set_on_insert, set)).await
    }

    async fn count(&self, collection: Collection) -> Result<u64, StorageError> {
        let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", collection))
            .fetch_one(&self.pool)
            .await?;
        Ok(n.max(0) as u64)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        if self.pool.is_closed() {
            return Err(StorageError::Unavailable(
                "connection pool is closed".to_string(),
            ));
        }
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
