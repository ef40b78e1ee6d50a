//! In-memory document store.
//!
//! Collections are insertion-ordered vectors behind a single `tokio::sync::RwLock`. Not
//! durable; intended for local development and tests. Mirrors the Mongo backend's
//! duplicate-key behavior for `_id` and for `facNumber` in the faculty collection.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::Document;
use tokio::sync::RwLock;

use super::{id_string, Collection, DocumentStore, StoreError, StoreResult};

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in `collection`.
    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }
}

fn matches_id(document: &Document, id: &str) -> bool {
    document
        .get("_id")
        .and_then(id_string)
        .is_some_and(|candidate| candidate == id)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(&collection)
            .and_then(|documents| documents.iter().find(|doc| matches_id(doc, id)))
            .cloned())
    }

    async fn insert(&self, collection: Collection, mut document: Document) -> StoreResult<String> {
        if !document.contains_key("_id") {
            document.insert("_id", ObjectId::new());
        }
        let id = document
            .get("_id")
            .and_then(id_string)
            .ok_or_else(|| StoreError::Validation("unsupported _id type".to_string()))?;

        let mut guard = self.collections.write().await;
        let documents = guard.entry(collection).or_default();
        if documents.iter().any(|doc| matches_id(doc, &id)) {
            return Err(StoreError::Validation(format!(
                "duplicate key in {collection}: _id {id}"
            )));
        }
        if collection == Collection::FacultyNumbers {
            let number = document.get_str("facNumber").map_err(|_| {
                StoreError::Validation("facNumber is required and must be a string".to_string())
            })?;
            if documents
                .iter()
                .any(|doc| doc.get_str("facNumber").is_ok_and(|existing| existing == number))
            {
                return Err(StoreError::Validation(format!(
                    "duplicate key in {collection}: facNumber {number}"
                )));
            }
        }
        documents.push(document);
        Ok(id)
    }

    async fn delete_by_id(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        let mut guard = self.collections.write().await;
        let Some(documents) = guard.get_mut(&collection) else {
            return Ok(false);
        };
        match documents.iter().position(|doc| matches_id(doc, id)) {
            Some(index) => {
                documents.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<Document>> {
        let guard = self.collections.read().await;
        Ok(guard.get(&collection).cloned().unwrap_or_default())
    }

    async fn exists(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
        _max_time: Duration,
    ) -> StoreResult<bool> {
        let guard = self.collections.read().await;
        Ok(guard.get(&collection).is_some_and(|documents| {
            documents
                .iter()
                .any(|doc| doc.get_str(field).is_ok_and(|candidate| candidate == value))
        }))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
