//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use crate::error::{MediaError, Result};
use crate::models::{ContactMessage, Document, MediaRef, UploadFile};
use async_trait::async_trait;
use serde_json::Value;

/// Equality filter on one top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub equals: Value,
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, equals: impl Into<Value>) -> Self {
        Self { field: field.into(), equals: equals.into() }
    }
}

/// Ordering over the store-assigned creation timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    NewestFirst,
    OldestFirst,
}

/// Hosted document database contract. Records are JSON objects grouped in
/// named collections; timestamps are assigned by the store.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a record and returns its new id.
    async fn create(&self, collection: &str, fields: Value) -> Result<String>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Merges `fields` into the top level of an existing record.
    /// Fails with `NotFound` when the record does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()>;

    /// Removing a missing record is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    async fn query(
        &self,
        collection: &str,
        filter: Option<FieldFilter>,
        order: SortOrder,
    ) -> Result<Vec<Document>>;

    /// Atomically adds `delta` to a numeric field (missing counts as 0),
    /// flooring the result at 0. Returns the new value.
    async fn increment(&self, collection: &str, id: &str, field: &str, delta: i64) -> Result<i64>;
}

/// Media CDN contract for hosting uploaded files.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Uploads a file and returns where it lives and what kind it is.
    async fn upload(&self, file: UploadFile) -> std::result::Result<MediaRef, MediaError>;

    /// Removes a previously uploaded file. Callers treat failure as non-fatal.
    async fn delete_by_url(&self, url: &str) -> std::result::Result<(), MediaError>;
}

/// Third-party email-send contract used by the contact form.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &ContactMessage) -> Result<()>;
}

/// The single shared admin secret.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AdminAuth: Send + Sync {
    /// False when no secret was configured; every login then fails.
    fn is_configured(&self) -> bool;

    /// Compares a submitted password against the configured secret.
    fn verify(&self, submitted: &str) -> bool;
}
