//! # folio-db-sqlite Implementation
//!
//! A `DocumentStore` on top of a single SQLite table. Each row holds one JSON
//! document of a named collection; timestamps are assigned here, never by the
//! caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_core::error::{AppError, Result};
use folio_core::models::Document;
use folio_core::traits::{DocumentStore, FieldFilter, SortOrder};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

const SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS documents (
    collection  TEXT    NOT NULL,
    id          TEXT    NOT NULL,
    fields      TEXT    NOT NULL,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER,
    PRIMARY KEY (collection, id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_documents_created ON documents (collection, created_at)",
];

pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Opens (or creates) the database at `url` and ensures the table exists.
    /// `sqlite::memory:` gives a private in-memory store.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let in_memory = url.contains(":memory:");

        // An in-memory database lives and dies with its one connection.
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().max_connections(5).connect_with(options).await?
        };

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        log::info!("document store ready at {}", url);
        Ok(Self { pool })
    }

    async fn insert(&self, collection: &str, fields: Value) -> anyhow::Result<String> {
        let id = Uuid::now_v7().to_string();
        sqlx::query(
            "INSERT INTO documents (collection, id, fields, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(collection)
        .bind(&id)
        .bind(serde_json::to_string(&fields)?)
        .bind(Utc::now().timestamp_micros())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn fetch(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query(
            "SELECT id, fields, created_at, updated_at FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_document).transpose()
    }

    /// Returns false when the record does not exist.
    async fn merge(&self, collection: &str, id: &str, fields: Value) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let current: Option<String> =
            sqlx::query_scalar("SELECT fields FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(current) = current else {
            return Ok(false);
        };

        let mut merged: Map<String, Value> = serde_json::from_str(&current)?;
        if let Value::Object(update) = fields {
            merged.extend(update);
        } else {
            anyhow::bail!("update for {collection}/{id} is not a JSON object");
        }

        sqlx::query("UPDATE documents SET fields = ?, updated_at = ? WHERE collection = ? AND id = ?")
            .bind(serde_json::to_string(&merged)?)
            .bind(Utc::now().timestamp_micros())
            .bind(collection)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn remove(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(
        &self,
        collection: &str,
        filter: Option<FieldFilter>,
        order: SortOrder,
    ) -> anyhow::Result<Vec<Document>> {
        let sql = match order {
            SortOrder::NewestFirst => {
                "SELECT id, fields, created_at, updated_at FROM documents WHERE collection = ? ORDER BY created_at DESC, id DESC"
            }
            SortOrder::OldestFirst => {
                "SELECT id, fields, created_at, updated_at FROM documents WHERE collection = ? ORDER BY created_at ASC, id ASC"
            }
        };
        let rows = sqlx::query(sql).bind(collection).fetch_all(&self.pool).await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let doc = row_to_document(row)?;
            let keep = match &filter {
                Some(f) => doc.fields.get(&f.field) == Some(&f.equals),
                None => true,
            };
            if keep {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    async fn add_to_counter(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> anyhow::Result<Option<i64>> {
        let path = format!("$.{field}");
        let value: Option<i64> = sqlx::query_scalar(
            "UPDATE documents
                SET fields = json_set(fields, ?1, MAX(0, COALESCE(json_extract(fields, ?1), 0) + ?2))
              WHERE collection = ?3 AND id = ?4
          RETURNING json_extract(fields, ?1)",
        )
        .bind(&path)
        .bind(delta)
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }
}

fn row_to_document(row: SqliteRow) -> anyhow::Result<Document> {
    let fields: String = row.try_get("fields")?;
    let created_at: i64 = row.try_get("created_at")?;
    let updated_at: Option<i64> = row.try_get("updated_at")?;
    Ok(Document {
        id: row.try_get("id")?,
        fields: serde_json::from_str(&fields)?,
        created_at: micros_to_time(created_at),
        updated_at: updated_at.map(micros_to_time),
    })
}

fn micros_to_time(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}

fn persistence(err: anyhow::Error) -> AppError {
    log::error!("document store failure: {:#}", err);
    AppError::Persistence(err.to_string())
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn create(&self, collection: &str, fields: Value) -> Result<String> {
        if !fields.is_object() {
            return Err(AppError::validation("documents must be JSON objects"));
        }
        self.insert(collection, fields).await.map_err(persistence)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.fetch(collection, id).await.map_err(persistence)
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        match self.merge(collection, id, fields).await.map_err(persistence)? {
            true => Ok(()),
            false => Err(AppError::not_found(collection, id)),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.remove(collection, id).await.map_err(persistence)
    }

    async fn query(
        &self,
        collection: &str,
        filter: Option<FieldFilter>,
        order: SortOrder,
    ) -> Result<Vec<Document>> {
        self.list(collection, filter, order).await.map_err(persistence)
    }

    async fn increment(&self, collection: &str, id: &str, field: &str, delta: i64) -> Result<i64> {
        self.add_to_counter(collection, id, field, delta)
            .await
            .map_err(persistence)?
            .ok_or_else(|| AppError::not_found(collection, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store() -> SqliteDocumentStore {
        SqliteDocumentStore::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = store().await;
        let id = store.create("thoughts", json!({ "title": "Hello" })).await.unwrap();

        let doc = store.get("thoughts", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["title"], "Hello");
        assert!(doc.updated_at.is_none());
        assert!(store.get("comments", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_merges_top_level_fields() {
        let store = store().await;
        let id = store
            .create("thoughts", json!({ "title": "Old", "content": "legacy", "likeCount": 2 }))
            .await
            .unwrap();

        store
            .update("thoughts", &id, json!({ "title": "New", "blocks": [] }))
            .await
            .unwrap();

        let doc = store.get("thoughts", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["title"], "New");
        assert_eq!(doc.fields["content"], "legacy");
        assert_eq!(doc.fields["likeCount"], 2);
        assert_eq!(doc.fields["blocks"], json!([]));
        assert!(doc.updated_at.is_some());
    }

    #[tokio::test]
    async fn update_of_missing_record_is_not_found() {
        let err = store().await.update("thoughts", "nope", json!({})).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));
    }

    #[tokio::test]
    async fn query_filters_and_orders() {
        let store = store().await;
        let first = store.create("comments", json!({ "thoughtId": "a", "n": 1 })).await.unwrap();
        store.create("comments", json!({ "thoughtId": "b", "n": 2 })).await.unwrap();
        let third = store.create("comments", json!({ "thoughtId": "a", "n": 3 })).await.unwrap();

        let newest = store
            .query("comments", Some(FieldFilter::eq("thoughtId", "a")), SortOrder::NewestFirst)
            .await
            .unwrap();
        assert_eq!(newest.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), [third.as_str(), first.as_str()]);

        let oldest = store.query("comments", None, SortOrder::OldestFirst).await.unwrap();
        assert_eq!(oldest.len(), 3);
        assert_eq!(oldest[0].id, first);
    }

    #[tokio::test]
    async fn increment_is_floored_at_zero() {
        let store = store().await;
        let id = store.create("thoughts", json!({ "title": "t" })).await.unwrap();

        assert_eq!(store.increment("thoughts", &id, "likeCount", 1).await.unwrap(), 1);
        assert_eq!(store.increment("thoughts", &id, "likeCount", -1).await.unwrap(), 0);
        assert_eq!(store.increment("thoughts", &id, "likeCount", -1).await.unwrap(), 0);

        let doc = store.get("thoughts", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["likeCount"], 0);
    }

    #[tokio::test]
    async fn increment_of_missing_record_is_not_found() {
        let err = store().await.increment("thoughts", "ghost", "likeCount", 1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = store().await;
        let id = store.create("thoughts", json!({})).await.unwrap();
        store.delete("thoughts", &id).await.unwrap();
        store.delete("thoughts", &id).await.unwrap();
        assert!(store.get("thoughts", &id).await.unwrap().is_none());
    }
}
