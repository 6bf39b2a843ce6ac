//! FincaFácil Analytics API - Entry Point
//!
//! Composition root: builds the services, optionally starts the aggregation
//! job scheduler, and serves the read-only analytics API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fincafacil_api::{audit, cache, config, create_router, AppState};
use fincafacil_core::analytics::jobs::{
    AlertasJob, AnalyticsJob, AutonomiaJob, IaJob, JobScheduler, ProductividadJob,
};
use fincafacil_core::analytics::sources::ArchivoOperacional;
use fincafacil_core::analytics::{AnalyticsService, AnalyticsStore};
use fincafacil_core::risk::RiskManagementService;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fincafacil_api=debug,fincafacil_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("FincaFácil Analytics API starting...");
    tracing::info!("Read models: {}", config.db_path.display());

    // Open the read-model store
    let store = Arc::new(
        AnalyticsStore::open(&config.db_path).expect("Failed to open analytics store"),
    );
    let analytics = Arc::new(AnalyticsService::new(store));
    let riesgos = Arc::new(RiskManagementService::new());

    let audit = Arc::new(
        audit::AuditTrail::open(&config.audit_path).expect("Failed to open audit trail"),
    );

    // Aggregation jobs, when an operational export is configured.
    // The handle must outlive the server.
    let _scheduler = iniciar_jobs(&config, analytics.clone());

    let state = AppState {
        analytics,
        riesgos,
        cache: Arc::new(cache::ResponseCache::new()),
        audit,
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server port");
    axum::serve(listener, app).await.expect("Server error");
}

/// Wire the four jobs against the configured operational source and start
/// the hourly trigger. Returns `None` (jobs disabled) when no source is
/// configured or it cannot be read.
fn iniciar_jobs(
    config: &config::Config,
    analytics: Arc<AnalyticsService>,
) -> Option<JobScheduler> {
    let ruta = config.fuente_operacional.as_ref()?;

    let fuente = match ArchivoOperacional::abrir(ruta) {
        Ok(fuente) => Arc::new(fuente),
        Err(e) => {
            tracing::error!("Fuente operacional no disponible, jobs desactivados: {}", e);
            return None;
        }
    };

    let jobs: Vec<Arc<dyn AnalyticsJob>> = vec![
        Arc::new(ProductividadJob::new(fuente.clone(), analytics.clone())),
        Arc::new(AlertasJob::new(fuente.clone(), analytics.clone())),
        Arc::new(IaJob::new(fuente.clone(), analytics.clone())),
        Arc::new(AutonomiaJob::new(fuente, analytics)),
    ];

    tracing::info!(
        "Scheduler de jobs activo para {} empresa(s)",
        config.empresas.len()
    );
    Some(JobScheduler::start(
        jobs,
        config.empresas.clone(),
        Duration::from_secs(fincafacil_core::constants::get_intervalo_jobs()),
        Duration::from_secs(fincafacil_core::constants::get_escalonado_jobs()),
    ))
}
