use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Args;
use tracing::{info, warn};

use crate::app::{router, AppState};
use crate::config::config;
use crate::store::PgStore;

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (overrides RIO_API_PORT/PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Keep products and admins in process memory instead of Postgres")]
    pub in_memory: bool,
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = config().clone();
    if let Some(port) = args.port {
        config.api.port = port;
    }

    if config.security.enforce_permissions && config.security.jwt_secret.is_empty() {
        bail!("permission enforcement is on but JWT_SECRET is not set");
    }

    if !config.security.enforce_permissions && !crate::is_development!() {
        warn!("Permission enforcement is off; admin and product writes are unrestricted");
    }

    info!("Starting Rio API in {:?} mode", config.environment);

    let port = config.api.port;
    let (state, database) = if args.in_memory {
        warn!("Using the in-memory store; data is lost on exit");
        (AppState::in_memory(config), None)
    } else {
        let database = super::connect_and_migrate(&config).await?;
        let store = Arc::new(PgStore::new(&database));
        (AppState::new(store.clone(), store, config), Some(database))
    };

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Rio API listening on http://{}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(database) = database {
        database.close().await;
    }
    info!("Rio API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
