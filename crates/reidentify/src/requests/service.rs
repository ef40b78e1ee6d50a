use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{RecordId, RequestRecord, RequestStatus};
use crate::config::WorkflowConfig;
use crate::store::{Collection, DocumentStore, StoreError};

/// Moves pending ID-card requests into the print queue or the rejected pile.
///
/// A transition is a copy followed by a delete with no rollback: a failed copy leaves the
/// request pending, a failed delete leaves it in both places. Two concurrent transitions
/// on the same id can both copy before either deletes.
pub struct RequestWorkflow<S> {
    store: Arc<S>,
    reject_unknown_status: bool,
}

impl<S> RequestWorkflow<S>
where
    S: DocumentStore + 'static,
{
    pub fn new(store: Arc<S>, config: &WorkflowConfig) -> Self {
        Self {
            store,
            reject_unknown_status: config.reject_unknown_status,
        }
    }

    /// Apply `status` to the pending request `id`, returning the confirmation message.
    pub async fn set_status(
        &self,
        id: &RecordId,
        status: &str,
    ) -> Result<String, RequestServiceError> {
        let status = RequestStatus::parse(status);

        let record = self
            .store
            .find_by_id(Collection::Pending, &id.0)
            .await?
            .map(RequestRecord::from)
            .ok_or_else(|| RequestServiceError::NotFound(id.clone()))?;

        match status.destination() {
            Some(destination) => {
                let copy_id = self
                    .store
                    .insert(destination, record.copy_without_id())
                    .await?;
                info!(request = %id, %destination, copy = %copy_id, "request copied");
            }
            None if self.reject_unknown_status => {
                return Err(RequestServiceError::UnrecognizedStatus(
                    status.label().to_string(),
                ));
            }
            None => {
                warn!(request = %id, status = status.label(), "unrecognized status; discarding request");
            }
        }

        if !self.store.delete_by_id(Collection::Pending, &id.0).await? {
            warn!(request = %id, "pending request vanished before delete");
        }

        Ok(format!("Request {} successfully", status.label()))
    }

    /// Every document in `collection`, verbatim.
    pub async fn list(
        &self,
        collection: Collection,
    ) -> Result<Vec<RequestRecord>, RequestServiceError> {
        let documents = self.store.list(collection).await?;
        Ok(documents.into_iter().map(RequestRecord::from).collect())
    }
}

/// Error raised by the request workflow.
#[derive(Debug, thiserror::Error)]
pub enum RequestServiceError {
    #[error("request {0} not found")]
    NotFound(RecordId),
    #[error("unrecognized status '{0}'; expected 'approved' or 'rejected'")]
    UnrecognizedStatus(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
