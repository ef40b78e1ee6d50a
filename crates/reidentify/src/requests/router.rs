use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::RecordId;
use super::service::{RequestServiceError, RequestWorkflow};
use crate::error::internal_error;
use crate::store::{Collection, DocumentStore};

/// Body of `PATCH /api/requests/:id/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// Router exposing the transition endpoint and the collection listings.
pub fn request_router<S>(service: Arc<RequestWorkflow<S>>) -> Router
where
    S: DocumentStore + 'static,
{
    Router::new()
        .route("/api/requests/:id/status", patch(status_handler::<S>))
        .route("/api/pending", get(pending_handler::<S>))
        .route("/api/approved", get(approved_handler::<S>))
        .route("/api/rejected", get(rejected_handler::<S>))
        .route("/api/acchistoryids", get(accepted_history_handler::<S>))
        .route("/api/rejhistoryids", get(rejected_history_handler::<S>))
        .with_state(service)
}

pub(crate) async fn status_handler<S>(
    State(service): State<Arc<RequestWorkflow<S>>>,
    Path(id): Path<String>,
    axum::Json(update): axum::Json<StatusUpdate>,
) -> Response
where
    S: DocumentStore + 'static,
{
    let id = RecordId(id);
    match service.set_status(&id, &update.status).await {
        Ok(message) => (StatusCode::OK, axum::Json(json!({ "message": message }))).into_response(),
        Err(RequestServiceError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "message": "Request not found" })),
        )
            .into_response(),
        Err(err @ RequestServiceError::UnrecognizedStatus(_)) => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({ "message": err.to_string() })),
        )
            .into_response(),
        Err(err) => {
            error!(request = %id, error = %err, "error updating request");
            internal_error()
        }
    }
}

async fn list_collection<S>(service: &RequestWorkflow<S>, collection: Collection) -> Response
where
    S: DocumentStore + 'static,
{
    match service.list(collection).await {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(err) => {
            error!(%collection, error = %err, "error fetching {}", collection.label());
            internal_error()
        }
    }
}

pub(crate) async fn pending_handler<S>(State(service): State<Arc<RequestWorkflow<S>>>) -> Response
where
    S: DocumentStore + 'static,
{
    list_collection(&service, Collection::Pending).await
}

pub(crate) async fn approved_handler<S>(State(service): State<Arc<RequestWorkflow<S>>>) -> Response
where
    S: DocumentStore + 'static,
{
    list_collection(&service, Collection::Approved).await
}

pub(crate) async fn rejected_handler<S>(State(service): State<Arc<RequestWorkflow<S>>>) -> Response
where
    S: DocumentStore + 'static,
{
    list_collection(&service, Collection::Rejected).await
}

pub(crate) async fn accepted_history_handler<S>(
    State(service): State<Arc<RequestWorkflow<S>>>,
) -> Response
where
    S: DocumentStore + 'static,
{
    list_collection(&service, Collection::AcceptedHistory).await
}

pub(crate) async fn rejected_history_handler<S>(
    State(service): State<Arc<RequestWorkflow<S>>>,
) -> Response
where
    S: DocumentStore + 'static,
{
    list_collection(&service, Collection::RejectedHistory).await
}
