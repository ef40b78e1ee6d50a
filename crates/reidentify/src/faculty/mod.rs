//! Faculty number validity lookups.

pub mod router;

use std::sync::Arc;
use std::time::Duration;

use crate::config::WorkflowConfig;
use crate::store::{Collection, DocumentStore, StoreError};

pub use router::{faculty_router, FacultyValidity};

/// Answers whether a faculty number is on file, within a fixed time bound.
pub struct FacultyDirectory<S> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S> FacultyDirectory<S>
where
    S: DocumentStore + 'static,
{
    pub fn new(store: Arc<S>, config: &WorkflowConfig) -> Self {
        Self {
            store,
            timeout: config.faculty_check_timeout,
        }
    }

    /// `Ok(false)` only when the store confirmed the number is absent.
    pub async fn check(&self, faculty_id: &str) -> Result<bool, FacultyCheckError> {
        let lookup = self.store.exists(
            Collection::FacultyNumbers,
            "facNumber",
            faculty_id,
            self.timeout,
        );
        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(found)) => Ok(found),
            Ok(Err(StoreError::Timeout(bound))) => Err(FacultyCheckError::Timeout(bound)),
            Ok(Err(err)) => Err(FacultyCheckError::Store(err)),
            Err(_) => Err(FacultyCheckError::Timeout(self.timeout)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FacultyCheckError {
    #[error("faculty lookup exceeded {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Store(#[from] StoreError),
}
