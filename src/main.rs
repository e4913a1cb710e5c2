// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;

use custodial_ledger::api::router;
use custodial_ledger::auth::KeyRing;
use custodial_ledger::config::ServerConfig;
use custodial_ledger::state::{unix_now, AppState};
use custodial_ledger::storage::LedgerDb;
use custodial_ledger::sweeper::Sweeper;
use tokio_util::sync::CancellationToken;

fn init_tracing(config: &ServerConfig) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let subscriber = fmt().with_env_filter(filter).with_target(false);

    if config.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();
    init_tracing(&config);

    let db_path = config.ledger_db_path();
    let db = LedgerDb::open(&db_path)?;
    tracing::info!(path = %db_path.display(), "Ledger database opened");

    let keyring = KeyRing::new(unix_now())?;

    let state = AppState::new(&config, db, keyring);

    let shutdown = CancellationToken::new();
    let sweeper = Sweeper::new(
        state.pool.clone(),
        config.sweep_interval,
        config.policy.deletion_delay,
    );
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown.clone()));

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Custodial ledger listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    if let Err(e) = sweeper_handle.await {
        tracing::warn!(error = %e, "Sweeper task ended abnormally");
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
