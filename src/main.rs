// Main entry point - Dependency injection, snapshot run and viewer setup
use std::{net::SocketAddr, sync::Arc, time::Duration};

use analytics_snapshot::application::orchestrator::{
    ConcurrentOrchestrator, SequentialOrchestrator, SnapshotOrchestrator,
};
use analytics_snapshot::application::snapshot_service::SnapshotService;
use analytics_snapshot::infrastructure::config::load_app_config;
use analytics_snapshot::infrastructure::http_client::HttpAnalyticsClient;
use analytics_snapshot::infrastructure::snapshot_store::SnapshotStore;
use analytics_snapshot::presentation::app_state::AppState;
use analytics_snapshot::presentation::handlers::router;
use anyhow::Context;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(HttpAnalyticsClient::new(
        config.service.base_url,
        config.service.token,
        Duration::from_secs(config.service.timeout_secs),
    )?);
    let store = SnapshotStore::new(config.snapshot.store_dir.clone());

    // Create services (application layer)
    let orchestrator: Arc<dyn SnapshotOrchestrator> = if config.snapshot.concurrent {
        Arc::new(ConcurrentOrchestrator::default())
    } else {
        Arc::new(SequentialOrchestrator::default())
    };
    let snapshot_service = SnapshotService::new(
        repository,
        orchestrator,
        store.clone(),
        config.snapshot.parallel_resources,
    );

    let reports = snapshot_service
        .snapshot_reports(&config.snapshot.reports, config.snapshot.all_reports)
        .await?;
    let dashboards = snapshot_service
        .snapshot_dashboards(&config.snapshot.dashboards, config.snapshot.all_dashboards)
        .await?;
    tracing::info!(
        "Snapshot run finished: {} reports stored, {} failed; {} dashboards stored, {} failed",
        reports.stored.len(),
        reports.failed.len(),
        dashboards.stored.len(),
        dashboards.failed.len()
    );

    if !config.server.serve {
        return Ok(());
    }

    // Build router (presentation layer)
    let state = Arc::new(AppState { store });
    let app = router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.listen))?;
    tracing::info!("Serving snapshots from {} on {}", config.snapshot.store_dir.display(), addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
