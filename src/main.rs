use anyhow::{Context, Result};
use clap::Parser;
use crm_core::config::CrmConfig;
use crm_core::core::SystemClock;
use crm_core::facade::Crm;
use crm_core::storage::{DurabilityMode, InMemoryStore};
use crm_core::web::{AppState, build_router_with_cors, cors_layer};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Flags override the matching `CRM_*` environment variables.
#[derive(Parser)]
#[command(name = "crm-server")]
#[command(about = "Sales funnel API: customers, contacts, leads, opportunities and activities")]
struct Args {
    #[arg(long)]
    host: Option<String>,
    #[arg(long, short)]
    port: Option<u16>,
    /// Snapshot file; omit to run purely in memory
    #[arg(long)]
    data: Option<PathBuf>,
    /// sync, async or none
    #[arg(long)]
    durability: Option<DurabilityMode>,
}

impl Args {
    fn apply(self, mut config: CrmConfig) -> CrmConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(path) = self.data {
            config.data_path = Some(path);
        }
        if let Some(mode) = self.durability {
            config.durability = mode;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = args.apply(CrmConfig::from_env().context("failed to load configuration")?);

    let store = match &config.data_path {
        Some(path) => Arc::new(
            InMemoryStore::open(path, config.durability)
                .with_context(|| format!("failed to open snapshot {}", path.display()))?,
        ),
        None => Arc::new(InMemoryStore::new()),
    };

    let crm = Crm::new(store.clone(), Arc::new(SystemClock))
        .with_page_limits(config.default_page_size, config.max_page_size);
    let app = build_router_with_cors(AppState::new(crm), cors_layer(config.cors_origin.as_deref()));

    let address = config.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind TCP listener on {address}"))?;

    tracing::info!(
        %address,
        data = ?config.data_path,
        durability = %config.durability,
        "crm-server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated unexpectedly")?;

    store
        .checkpoint()
        .await
        .context("failed to write final snapshot")?;
    tracing::info!("crm-server stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("crm_core=debug,crm_server=debug,tower_http=info")),
        )
        .with(fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
