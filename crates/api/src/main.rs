//! Petsit API server

use std::sync::Arc;

use anyhow::Context;
use petsit_api::{create_router, AppState, Config};
use petsit_billing::{BillingService, GraceSettingsStore, InMemoryGraceSettings, PgGraceSettings};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,petsit_api=debug,petsit_billing=debug"));
    let log_json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");

    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to register SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("invalid configuration")?;

    let settings: Arc<dyn GraceSettingsStore> = match &config.database_url {
        Some(url) => {
            let pool = petsit_shared::create_pool(url, config.database_max_connections)
                .await
                .context("failed to connect to database")?;
            petsit_shared::run_migrations(&pool)
                .await
                .context("failed to run migrations")?;
            tracing::info!("Grace period setting stored in Postgres");
            Arc::new(PgGraceSettings::new(pool, config.default_grace))
        }
        None => {
            tracing::warn!(
                grace_days = config.default_grace.grace_days,
                "DATABASE_URL not set, grace period setting kept in memory"
            );
            Arc::new(InMemoryGraceSettings::new(config.default_grace))
        }
    };

    let billing = BillingService::from_env(settings).context("invalid billing configuration")?;
    tracing::info!(
        plans = billing.catalog().plans.len(),
        "Billing service initialized"
    );

    let bind_address = config.bind_address.clone();
    let app = create_router(AppState::new(config, billing));

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    tracing::info!(address = %bind_address, "Petsit API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
