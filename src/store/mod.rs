//! Document Store
//!
//! Profiles, bookmarks, friend requests, groups and channels are kept as
//! JSON documents in a Firestore-shaped hierarchy:
//!
//! ```text
//! users/{uid}
//! users/{uid}/bookmarks/{restaurantId}
//! friendRequests/{id}
//! groups/{id}
//! groups/{id}/messages/{id}
//! publicChannels/{id}
//! publicChannels/{id}/messages/{id}
//! publicChannels/{id}/events/{id}
//! ```
//!
//! Two backends implement [`DocumentStore`]:
//!
//! - [`FirestoreStore`]: Cloud Firestore over its REST API
//! - [`MemoryStore`]: process-local, for development and tests

pub mod error;
pub mod firestore;
pub mod memory;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use firestore::{FirestoreConfig, FirestoreStore};
pub use memory::MemoryStore;
pub use types::{fields, timestamp_now, Direction, Document, Fields, Filter, Query};

use async_trait::async_trait;
use serde_json::Value;

/// Hierarchical JSON document storage
///
/// Paths are slash-separated and relative to the database root. Document
/// paths have an even number of segments, collection paths an odd number.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &str) -> StoreResult<Option<Document>>;

    /// Write a document; `merge` keeps fields not present in `fields`
    async fn set(&self, path: &str, fields: Fields, merge: bool) -> StoreResult<()>;

    /// Create a document with a generated id, returning the id
    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String>;

    /// Delete a document; deleting a missing document is not an error
    async fn delete(&self, path: &str) -> StoreResult<()>;

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>>;

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>>;

    /// Append values not already present; creates the document if needed
    async fn array_union(&self, path: &str, field: &str, values: Vec<Value>) -> StoreResult<()>;

    /// Remove every occurrence of the values; creates the document if needed
    async fn array_remove(&self, path: &str, field: &str, values: Vec<Value>) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;

    fn backend(&self) -> &'static str;
}
