//! # Playbook Server Library
//!
//! Hosts playbook widgets over HTTP.
//! This library is used by both the binary and integration tests.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};
use playbook_renderer::{ExportConfig, WidgetExporter};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod routes;
pub mod store;
pub mod validation;

pub use config::ServerConfig;
pub use error::ApiError;
pub use store::{StoreError, WidgetStore, WidgetSummary};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Hosted widgets.
    pub store: WidgetStore,
    /// Export pipeline.
    pub exporter: Arc<WidgetExporter>,
}

impl AppState {
    /// Create state around `store`.
    #[must_use]
    pub fn new(store: WidgetStore, export: ExportConfig) -> Self {
        Self {
            store,
            exporter: Arc::new(WidgetExporter::new(export)),
        }
    }
}

/// Build the API and health router with request tracing.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/health", get(health::readiness))
        .route("/api/widgets", get(routes::list_widgets))
        .route("/api/widgets/{widget_id}", get(routes::get_widget))
        .route("/api/widgets/{widget_id}/record", get(routes::get_record))
        .route(
            "/api/widgets/{widget_id}/export/{format}",
            get(routes::export_widget),
        )
        .route(
            "/api/widgets/{widget_id}/{collection}/items",
            post(routes::add_item),
        )
        .route(
            "/api/widgets/{widget_id}/{collection}/items/{item_id}",
            patch(routes::update_item).delete(routes::remove_item),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                ),
        )
        .with_state(state)
}

/// Playbook server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
