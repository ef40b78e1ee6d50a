use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::FacultyDirectory;
use crate::error::internal_error;
use crate::store::DocumentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyValidity {
    pub valid: bool,
}

pub fn faculty_router<S>(directory: Arc<FacultyDirectory<S>>) -> Router
where
    S: DocumentStore + 'static,
{
    Router::new()
        .route("/api/check-faculty/:id", get(check_handler::<S>))
        .with_state(directory)
}

pub(crate) async fn check_handler<S>(
    State(directory): State<Arc<FacultyDirectory<S>>>,
    Path(faculty_id): Path<String>,
) -> Response
where
    S: DocumentStore + 'static,
{
    match directory.check(&faculty_id).await {
        Ok(valid) => (StatusCode::OK, axum::Json(FacultyValidity { valid })).into_response(),
        Err(err) => {
            error!(faculty = %faculty_id, error = %err, "error checking faculty id");
            internal_error()
        }
    }
}
