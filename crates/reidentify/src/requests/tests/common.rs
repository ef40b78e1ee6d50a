use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use mongodb::bson::{doc, Document};
use serde_json::Value;

use crate::config::WorkflowConfig;
use crate::requests::RequestWorkflow;
use crate::store::{Collection, DocumentStore, MemoryStore, StoreError, StoreResult};

pub(super) fn lenient() -> WorkflowConfig {
    WorkflowConfig::default()
}

pub(super) fn strict() -> WorkflowConfig {
    WorkflowConfig {
        reject_unknown_status: true,
        ..WorkflowConfig::default()
    }
}

pub(super) fn submission() -> Document {
    doc! {
        "_id": "A",
        "name": "X",
        "facNumber": "F100",
        "department": "Mechanical",
        "bloodGroup": "O+",
    }
}

pub(super) async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(Collection::Pending, submission())
        .await
        .expect("seed pending request");
    store
}

pub(super) fn build_service(
    store: Arc<MemoryStore>,
    config: &WorkflowConfig,
) -> RequestWorkflow<MemoryStore> {
    RequestWorkflow::new(store, config)
}

pub(super) async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

pub(super) struct UnavailableStore;

#[async_trait]
impl DocumentStore for UnavailableStore {
    async fn find_by_id(&self, _: Collection, _: &str) -> StoreResult<Option<Document>> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn insert(&self, _: Collection, _: Document) -> StoreResult<String> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn delete_by_id(&self, _: Collection, _: &str) -> StoreResult<bool> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn list(&self, _: Collection) -> StoreResult<Vec<Document>> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn exists(&self, _: Collection, _: &str, _: &str, _: Duration) -> StoreResult<bool> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "unavailable"
    }
}

/// Reads succeed but every insert fails, so the copy step of a transition breaks.
#[derive(Default)]
pub(super) struct ReadOnlyStore {
    pub(super) inner: MemoryStore,
}

#[async_trait]
impl DocumentStore for ReadOnlyStore {
    async fn find_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        self.inner.find_by_id(collection, id).await
    }

    async fn insert(&self, _: Collection, _: Document) -> StoreResult<String> {
        Err(StoreError::Unavailable("read only".to_string()))
    }

    async fn delete_by_id(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        self.inner.delete_by_id(collection, id).await
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<Document>> {
        self.inner.list(collection).await
    }

    async fn exists(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
        max_time: Duration,
    ) -> StoreResult<bool> {
        self.inner.exists(collection, field, value, max_time).await
    }

    fn backend_name(&self) -> &'static str {
        "read-only"
    }
}

/// Inserts land but deletes fail, so a transition copies without clearing the pending entry.
#[derive(Default)]
pub(super) struct UndeletableStore {
    pub(super) inner: MemoryStore,
}

#[async_trait]
impl DocumentStore for UndeletableStore {
    async fn find_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        self.inner.find_by_id(collection, id).await
    }

    async fn insert(&self, collection: Collection, document: Document) -> StoreResult<String> {
        self.inner.insert(collection, document).await
    }

    async fn delete_by_id(&self, _: Collection, _: &str) -> StoreResult<bool> {
        Err(StoreError::Unavailable("delete refused".to_string()))
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<Document>> {
        self.inner.list(collection).await
    }

    async fn exists(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
        max_time: Duration,
    ) -> StoreResult<bool> {
        self.inner.exists(collection, field, value, max_time).await
    }

    fn backend_name(&self) -> &'static str {
        "undeletable"
    }
}
