//! In-memory document store

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::error::StoreResult;
use super::types::{compare_values, split_document_path, validate_collection_path, Direction, Document, Fields, Query};
use super::DocumentStore;

/// Collections keyed by path, documents keyed by id
type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents across every collection
    #[cfg(test)]
    pub(crate) async fn document_count(&self) -> usize {
        self.collections.read().await.values().map(BTreeMap::len).sum()
    }

    async fn update_array<F>(&self, path: &str, field: &str, apply: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Vec<Value>) + Send,
    {
        let (collection, id) = split_document_path(path)?;
        let mut collections = self.collections.write().await;
        let doc = collections
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_default();

        let slot = doc
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(values) = slot {
            apply(values);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> StoreResult<Option<Document>> {
        let (collection, id) = split_document_path(path)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(path, fields.clone())))
    }

    async fn set(&self, path: &str, fields: Fields, merge: bool) -> StoreResult<()> {
        let (collection, id) = split_document_path(path)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        if merge {
            if let Some(existing) = docs.get_mut(id) {
                existing.extend(fields);
                return Ok(());
            }
        }
        docs.insert(id.to_string(), fields);
        Ok(())
    }

    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        validate_collection_path(collection)?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        let (collection, id) = split_document_path(path)?;
        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        validate_collection_path(collection)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(format!("{}/{}", collection, id), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        let mut docs: Vec<Document> = self
            .list(collection)
            .await?
            .into_iter()
            .filter(|d| query.matches(&d.fields))
            .collect();

        if let Some((field, direction)) = &query.order_by {
            // Documents without the field are excluded, as in Firestore
            docs.retain(|d| d.fields.contains_key(field));
            docs.sort_by(|a, b| {
                let ord = compare_values(&a.fields[field], &b.fields[field])
                    .unwrap_or(std::cmp::Ordering::Equal);
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    async fn array_union(&self, path: &str, field: &str, values: Vec<Value>) -> StoreResult<()> {
        self.update_array(path, field, move |current| {
            for value in values {
                if !current.contains(&value) {
                    current.push(value);
                }
            }
        })
        .await
    }

    async fn array_remove(&self, path: &str, field: &str, values: Vec<Value>) -> StoreResult<()> {
        self.update_array(path, field, move |current| {
            current.retain(|v| !values.contains(v));
        })
        .await
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
