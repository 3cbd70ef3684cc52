//! # Server Configuration
//!
//! This module contains the router, shared state and server startup for the
//! activity feed.

use std::any::Any;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers;
use crate::repositories::{ActionRepository, ActionStore};

/// GitHub caps webhook payloads at 25 MB.
const MAX_WEBHOOK_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ActionStore>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn ActionStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}

fn internal_error_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Request handler panicked");
    ApiError::Internal.into_response()
}

fn fetch_failed_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Activity feed handler panicked");
    ApiError::FetchFailed.into_response()
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route(
            "/webhook",
            get(handlers::webhooks::webhook_status).post(handlers::webhooks::receive_webhook),
        )
        .route(
            "/test-webhook",
            get(handlers::webhooks::test_webhook_status)
                .post(handlers::webhooks::insert_test_action),
        )
        .route(
            "/api/actions",
            get(handlers::actions::list_actions)
                .layer(CatchPanicLayer::custom(fetch_failed_response)),
        )
        .layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY_BYTES))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(CatchPanicLayer::custom(internal_error_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Connects the store, applies migrations and serves until shutdown.
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;

    let db = crate::db::init_pool(&config).await?;
    crate::db::run_migrations(&db).await?;

    let store: Arc<dyn ActionStore> = Arc::new(ActionRepository::new(Arc::new(db)));
    let app = create_app(AppState::new(config.clone(), store));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, profile = %config.profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::webhooks::receive_webhook,
        crate::handlers::webhooks::webhook_status,
        crate::handlers::webhooks::insert_test_action,
        crate::handlers::webhooks::test_webhook_status,
        crate::handlers::actions::list_actions,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::webhooks::WebhookResponse,
            crate::handlers::actions::ActionFeedItem,
            crate::error::ErrorBody,
        )
    ),
    info(
        title = "Activity Feed API",
        description = "Receives GitHub webhooks and serves a formatted activity feed",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
