use std::env;
use std::sync::Arc;

use portal_audit::AuditLogger;
use portal_server::config::{DEFAULT_CONFIG_PATH, load_config};
use portal_server::{AppState, observability, router};
use portal_session::{MemorySessionStore, SessionSecurity};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; only real load failures are worth a warning.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: failed to load .env file: {e}");
        }
    }

    let config_path =
        env::var("PORTAL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = load_config(&config_path)?;

    observability::init_tracing(&cfg.logging.level);
    tracing::info!(path = %config_path, "Configuration loaded");

    let audit = Arc::new(AuditLogger::new().with_success_logging(cfg.logging.audit_successes));

    let store = Arc::new(MemorySessionStore::new());
    store.spawn_sweeper(
        cfg.session.sweep_interval,
        cfg.session.ttl,
        Arc::clone(&audit),
    );

    let security = Arc::new(SessionSecurity::new(
        store,
        cfg.session.clone(),
        Arc::clone(&audit),
    ));
    let state = AppState::new(security, audit, cfg.session.cookie.clone());

    let addr = cfg.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Portal BFF listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received, draining connections");
}
