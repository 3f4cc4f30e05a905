/**
 * SPEEDWATCH KERNEL - Point d'entrée du serveur
 *
 * RÔLE : Bootstrap : config, journal des infractions, poller ESP32, HTTP.
 * Le poller est déclenché au montage puis uniquement sur demande.
 *
 * ARCHITECTURE : ports mock (données + sonde) -> état partagé -> API REST.
 */

use anyhow::{Context, Result};
use speedwatch_kernel::config::load_config;
use speedwatch_kernel::device::DevicePoller;
use speedwatch_kernel::health::HealthTracker;
use speedwatch_kernel::http::{build_router, AppState};
use speedwatch_kernel::ports::mock::{MockViolationSource, SimulatedProbe};
use speedwatch_kernel::ports::ViolationSource;
use speedwatch_kernel::records::RecordStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env optionnel
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("speedwatch_kernel=info")),
        )
        .init();

    let cfg = load_config().await;

    // journal des infractions (immuable)
    let source = MockViolationSource;
    let store = RecordStore::from_source(&source);
    info!("[kernel] loaded {} violation records", store.len());

    // poller ESP32, sondage initial au montage
    let probe = Arc::new(SimulatedProbe::new(&cfg.poller));
    let poller = DevicePoller::new(probe, cfg.poller.delay());
    if cfg.poller.poll_on_start {
        poller.refresh();
    }

    let health = HealthTracker::new();
    let app_state = AppState::new(store.clone(), source.info(), poller.clone(), health.clone())
        .with_api_key(cfg.http.api_key.clone());

    let reporter = health.spawn_health_reporter(
        Duration::from_secs(cfg.health.report_interval_secs),
        store,
        poller.clone(),
        app_state.dashboard.traffic.clone(),
    );

    let app = build_router(app_state);

    let listener = TcpListener::bind(cfg.http.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.http.bind))?;
    info!("[kernel] listening on http://{}", cfg.http.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // démontage : plus aucun sondage ne doit s'appliquer
    poller.shutdown();
    if let Some(handle) = reporter {
        handle.abort();
    }
    info!("[kernel] stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[kernel] failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("[kernel] shutdown requested");
}
