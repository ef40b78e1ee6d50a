use crate::cli::ServeArgs;
use crate::infra::{cors_layer, AppState};
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use reidentify::config::AppConfig;
use reidentify::error::AppError;
use reidentify::faculty::FacultyDirectory;
use reidentify::requests::RequestWorkflow;
use reidentify::store::{DocumentStore, MemoryStore, MongoStore};
use reidentify::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if args.memory_store {
        warn!("serving from the in-memory store; nothing will be persisted");
        serve(config, Arc::new(MemoryStore::new())).await
    } else {
        let store = MongoStore::new(&config.store)?;
        serve(config, Arc::new(store)).await
    }
}

async fn serve<S>(config: AppConfig, store: Arc<S>) -> Result<(), AppError>
where
    S: DocumentStore + 'static,
{
    // Ping and index setup run in the background; an unreachable store never blocks the listener.
    tokio::spawn(prepare_store(store.clone()));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let workflow = Arc::new(RequestWorkflow::new(store.clone(), &config.workflow));
    let directory = Arc::new(FacultyDirectory::new(store.clone(), &config.workflow));

    let app = with_portal_routes(workflow, directory)
        .layer(Extension(app_state))
        .layer(cors_layer(&config.cors))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        backend = store.backend_name(),
        "ReIDentify backend ready; health check at /api/health"
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    readiness_flag.store(false, Ordering::Release);
    store.close().await;
    info!("document store closed");

    served?;
    Ok(())
}

async fn prepare_store<S>(store: Arc<S>)
where
    S: DocumentStore + 'static,
{
    match store.ping().await {
        Ok(()) => info!(backend = store.backend_name(), "document store connected"),
        Err(err) => {
            error!(error = %err, "document store connection error; requests will fail until it recovers");
            return;
        }
    }

    if let Err(err) = store.ensure_indexes().await {
        warn!(error = %err, "failed to create indexes for faculty numbers");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "unable to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received terminate signal, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use reidentify::config::{StoreConfig, WorkflowConfig};
    use std::time::Duration;
    use tower::ServiceExt;

    fn unresolvable_store() -> Arc<MongoStore> {
        let config = StoreConfig {
            uri: "mongodb+srv://cluster0.unresolvable-host.invalid/portal".to_string(),
            database: None,
            server_selection_timeout: Duration::from_millis(50),
            max_pool_size: 2,
        };
        Arc::new(MongoStore::new(&config).expect("srv uri is well-formed"))
    }

    #[tokio::test]
    async fn unresolvable_srv_store_boots_and_serves_internal_errors() {
        let store = unresolvable_store();
        prepare_store(store.clone()).await;

        let workflow = WorkflowConfig::default();
        let app = with_portal_routes(
            Arc::new(RequestWorkflow::new(store.clone(), &workflow)),
            Arc::new(FacultyDirectory::new(store, &workflow)),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/pending")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["message"], "Internal Server Error");
    }
}
