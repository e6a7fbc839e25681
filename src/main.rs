use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use brew_crew_service::{
    api::{self, AppState},
    auth::{self, TokenSigner},
    brewing::BrewingService,
    config::Config,
    db,
    rapt::{
        clock::{Clock, SystemClock},
        RaptClient,
    },
    storage::{MemStorage, PgStorage, Storage},
    writer::BlogWriter,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Env vars may be set externally, so a missing .env is fine.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let storage: Arc<dyn Storage> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            db::run_migrations(&pool).await?;
            info!("Database ready");
            Arc::new(PgStorage::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, using seeded in-memory store; nothing will persist");
            Arc::new(MemStorage::seeded())
        }
    };

    match &config.admin {
        Some(admin) => {
            let hash = auth::hash_password(&admin.password)?;
            storage
                .upsert_user(&admin.username, &hash)
                .await
                .context("Failed to bootstrap admin account")?;
            info!(username = %admin.username, "Admin account ready");
        }
        None => warn!("ADMIN_USERNAME/ADMIN_PASSWORD not set; no admin account was bootstrapped"),
    }

    if config.rapt.credentials().is_none() {
        warn!("RAPT credentials not set; brewing data will come from the store");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let rapt = RaptClient::new(&config.rapt, clock.clone());

    let state = AppState {
        storage: storage.clone(),
        brewing: BrewingService::new(storage, rapt, config.rapt.clone(), clock.clone()),
        writer: BlogWriter::new(config.writer.clone())?,
        signer: TokenSigner::new(&config.jwt_secret),
        cookies: config.cookie.clone(),
        clock,
    };

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
