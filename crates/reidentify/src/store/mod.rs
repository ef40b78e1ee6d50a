//! Document store access shared by the request workflow and the faculty lookup.
//!
//! Every operation is scoped to one [`Collection`] and one document at a time; the store
//! provides no cross-document atomicity. Two backends implement [`DocumentStore`]:
//! [`memory::MemoryStore`] for local runs and tests, and [`mongo::MongoStore`] for
//! deployments.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use thiserror::Error;

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Collections the service reads from or writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Requests awaiting a decision.
    Pending,
    /// Print queue.
    Approved,
    Rejected,
    AcceptedHistory,
    RejectedHistory,
    FacultyNumbers,
}

impl Collection {
    /// Physical collection name in the database.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Pending => "idcards",
            Collection::Approved => "printids",
            Collection::Rejected => "rejectedidcards",
            Collection::AcceptedHistory => "acchistoryids",
            Collection::RejectedHistory => "rejhistoryids",
            Collection::FacultyNumbers => "facultynumbers",
        }
    }

    /// Human label used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            Collection::Pending => "pending requests",
            Collection::Approved => "approved requests",
            Collection::Rejected => "rejected requests",
            Collection::AcceptedHistory => "approved history data",
            Collection::RejectedHistory => "rejected history data",
            Collection::FacultyNumbers => "faculty numbers",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Renders an `_id` value the way callers address it.
pub fn id_string(value: &Bson) -> Option<String> {
    match value {
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::String(raw) => Some(raw.clone()),
        Bson::Int32(raw) => Some(raw.to_string()),
        Bson::Int64(raw) => Some(raw.to_string()),
        _ => None,
    }
}

/// Failures raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("validation failed: {0}")]
    Validation(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Collection-scoped single-document operations.
///
/// Ids are the store's own identifiers rendered as strings. An id the backend cannot
/// interpret matches nothing.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>>;

    /// Inserts `document`, returning the identifier the store assigned or kept.
    async fn insert(&self, collection: Collection, document: Document) -> StoreResult<String>;

    /// Returns whether a document was removed.
    async fn delete_by_id(&self, collection: Collection, id: &str) -> StoreResult<bool>;

    async fn list(&self, collection: Collection) -> StoreResult<Vec<Document>>;

    /// Whether any document has `field == value`, giving up after `max_time`.
    async fn exists(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
        max_time: Duration,
    ) -> StoreResult<bool>;

    /// Creates the unique index on faculty numbers.
    async fn ensure_indexes(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Releases connections. The handle must not be used afterwards.
    async fn close(&self) {}

    fn backend_name(&self) -> &'static str;
}
