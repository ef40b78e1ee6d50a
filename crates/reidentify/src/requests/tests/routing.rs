use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Method, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::faculty::{faculty_router, FacultyDirectory};
use crate::requests::router::{status_handler, StatusUpdate};
use crate::requests::{request_router, RequestWorkflow};
use crate::store::{Collection, MemoryStore};

fn patch_status(id: &str, status: &str) -> Request<Body> {
    Request::builder()
        .method(Method::PATCH)
        .uri(format!("/api/requests/{id}/status"))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "status": status }).to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn patch_status_approves_and_listings_follow() {
    let store = seeded_store().await;
    let app = request_router(Arc::new(build_service(store, &lenient())));

    let response = app
        .clone()
        .oneshot(patch_status("A", "approved"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({ "message": "Request approved successfully" })
    );

    let pending = app
        .clone()
        .oneshot(get("/api/pending"))
        .await
        .expect("router responds");
    assert_eq!(pending.status(), StatusCode::OK);
    assert_eq!(read_json(pending).await, json!([]));

    let approved = read_json(
        app.oneshot(get("/api/approved"))
            .await
            .expect("router responds"),
    )
    .await;
    let records = approved.as_array().expect("array body");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], json!("X"));
    assert!(records[0]["_id"].is_string());
}

#[tokio::test]
async fn patch_status_returns_not_found_for_unknown_id() {
    let service = Arc::new(build_service(Arc::new(MemoryStore::new()), &lenient()));

    let response = status_handler::<MemoryStore>(
        State(service),
        Path("nope".to_string()),
        axum::Json(StatusUpdate {
            status: "approved".to_string(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        read_json(response).await,
        json!({ "message": "Request not found" })
    );
}

#[tokio::test]
async fn patch_status_is_bad_request_for_unknown_status_in_strict_mode() {
    let store = seeded_store().await;
    let app = request_router(Arc::new(build_service(store.clone(), &strict())));

    let response = app
        .oneshot(patch_status("A", "printed"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.count(Collection::Pending).await, 1);
}

#[tokio::test]
async fn store_failures_are_generic_internal_errors() {
    let store = Arc::new(UnavailableStore);
    let app = request_router(Arc::new(RequestWorkflow::new(store.clone(), &lenient())))
        .merge(faculty_router(Arc::new(FacultyDirectory::new(
            store,
            &lenient(),
        ))));

    for request in [
        patch_status("A", "approved"),
        get("/api/pending"),
        get("/api/approved"),
        get("/api/rejected"),
        get("/api/acchistoryids"),
        get("/api/rejhistoryids"),
        get("/api/check-faculty/F100"),
    ] {
        let response = app.clone().oneshot(request).await.expect("router responds");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            read_json(response).await,
            json!({ "message": "Internal Server Error" })
        );
    }
}

#[tokio::test]
async fn history_listings_return_empty_arrays() {
    let app = request_router(Arc::new(build_service(
        Arc::new(MemoryStore::new()),
        &lenient(),
    )));

    for uri in ["/api/acchistoryids", "/api/rejhistoryids", "/api/rejected"] {
        let response = app.clone().oneshot(get(uri)).await.expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!([]));
    }
}
