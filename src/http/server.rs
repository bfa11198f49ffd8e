//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, metrics, timeout)
//! - Bind server to listener
//! - Stop accepting and drain on shutdown

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::http::handlers;
use crate::http::middleware::track_metrics;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown::wait as wait_for_shutdown;
use crate::rules::RuleManager;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub rules: RuleManager,
}

/// HTTP server for the query service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: ServiceConfig, rules: RuleManager) -> Self {
        let router = build_router(&config, AppState { rules });
        Self { router }
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &ServiceConfig, state: AppState) -> Router {
    let api = Router::new()
        .route("/queries/disabled", post(handlers::check_disabled))
        .route("/rules", get(handlers::list_rules).post(handlers::upsert_rule))
        .route("/rules/{id}", get(handlers::get_rule).delete(handlers::delete_rule));

    Router::new()
        .route("/", get(handlers::root))
        .route("/books", get(handlers::books))
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(middleware::from_fn(track_metrics))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(set_request_id_layer())
}
