//! KeepVault server - multi-tenant secret vault over HTTP.
//!
//! Wires the storage backend, the vault core, and the API router together,
//! checks the master key against the store before serving, and shuts down
//! gracefully on SIGINT/SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use keepvault_api::{router, AppState};
use keepvault_crypto::{generate_readable_key, MasterKey, USER_KEY_LENGTH};
use keepvault_storage::{MemoryStore, SecretStore};
use keepvault_vault::VaultService;

#[derive(Parser)]
#[command(name = "keepvault-server")]
#[command(about = "KeepVault - multi-tenant secret vault server")]
#[command(version)]
struct Cli {
    /// Listen address.
    #[arg(short, long, default_value = "0.0.0.0:5000")]
    address: String,

    /// Server encryption master key. When absent a new key is generated and
    /// printed; the same key must be provided on every run against an
    /// existing store.
    #[arg(short = 'k', long)]
    master_key: Option<String>,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set up logging")?;

    let master_key = match cli.master_key.filter(|key| !key.is_empty()) {
        Some(key) => key,
        None => {
            let key = generate_readable_key(USER_KEY_LENGTH);
            warn!(
                "no master key provided, generated '{}'; provide the same key \
                 on every run against this store",
                key
            );
            key
        }
    };

    let store: Arc<dyn SecretStore> = Arc::new(MemoryStore::new());

    // Refuse to serve a store initialized with a different master key.
    store
        .ping(master_key.as_bytes())
        .await
        .context("store self-check failed")?;

    let vault = Arc::new(VaultService::new(
        store.clone(),
        MasterKey::from_bytes(master_key.into_bytes()),
    ));
    let app = router(AppState { vault });

    let listener = tokio::net::TcpListener::bind(&cli.address)
        .await
        .with_context(|| format!("failed to bind {}", cli.address))?;
    info!(address = %cli.address, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close().await.context("failed to close store")?;
    info!("server stopped gracefully");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
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

    info!("got signal to stop");
}
