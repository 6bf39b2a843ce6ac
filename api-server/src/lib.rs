//! FincaFácil Analytics API
//!
//! Read-only HTTP surface over the analytics read models, plus the risk
//! views the admin screens consume.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  FINCAFACIL ANALYTICS API                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌─────────────────────────┐  │
//! │  │  Router   │  │  TTL      │  │  Aggregation Jobs       │  │
//! │  │  (Axum)   │  │  Cache    │  │  (Background Thread)    │  │
//! │  └─────┬─────┘  └─────┬─────┘  └────────────┬────────────┘  │
//! │        └──────────────┼────────────────────-┘               │
//! │                       ▼                                     │
//! │              ┌────────────────┐                             │
//! │              │ SQLite (local) │                             │
//! │              └────────────────┘                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `/api/v1` call is audited to a JSONL trail; audit failures are
//! logged and never fail the read path.

pub mod audit;
pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use fincafacil_core::analytics::AnalyticsService;
use fincafacil_core::risk::RiskManagementService;

pub use error::{ApiError, ApiResult};

/// Shared application state, owned by the composition root.
#[derive(Clone)]
pub struct AppState {
    pub analytics: Arc<AnalyticsService>,
    pub riesgos: Arc<RiskManagementService>,
    pub cache: Arc<cache::ResponseCache>,
    pub audit: Arc<audit::AuditTrail>,
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    // Audited API routes
    let api_routes = Router::new()
        .route("/api/v1/analytics/overview", get(handlers::analytics::overview))
        .route("/api/v1/analytics/productividad", get(handlers::analytics::productividad))
        .route("/api/v1/analytics/alertas", get(handlers::analytics::alertas))
        .route("/api/v1/analytics/ia", get(handlers::analytics::ia))
        .route("/api/v1/analytics/autonomia", get(handlers::analytics::autonomia))
        .route("/api/v1/analytics/comparativos", get(handlers::analytics::comparativos))
        .route("/api/v1/riesgos/alertas", get(handlers::riesgos::alertas))
        .route("/api/v1/riesgos/usuarios", get(handlers::riesgos::usuarios))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::registrar_auditoria,
        ));

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(api_routes)
        .fallback(handlers::ruta_desconocida)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
