//! Payroll engine HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paie_engine::api::{AppState, create_router};
use paie_engine::config::ConfigLoader;
use paie_engine::models::{GeneralSettings, Period};
use paie_engine::service::PayrollService;
use paie_engine::store::PayrollStore;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "paie-engine")]
#[command(about = "Payroll closing, declarations and accounting export service")]
#[command(version)]
struct Args {
    /// Directory holding the YAML configuration files
    #[arg(short, long, default_value = "config/default", env = "PAIE_CONFIG")]
    config: PathBuf,

    /// SQLite database file
    #[arg(short, long, default_value = "paie.db", env = "PAIE_DATABASE")]
    database: PathBuf,

    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8080", env = "PAIE_LISTEN")]
    listen: SocketAddr,

    /// Report directory, overriding the company configuration
    #[arg(long, env = "PAIE_REPORT_DIR")]
    report_dir: Option<PathBuf>,

    /// Open period of a new database (defaults to the current month)
    #[arg(long, env = "PAIE_INITIAL_PERIOD")]
    initial_period: Option<Period>,

    /// License expiry written to a new database
    #[arg(long, env = "PAIE_LICENSE_EXPIRY")]
    license_expiry: NaiveDate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paie_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = ConfigLoader::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    let report_dir = args
        .report_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.config().company().report_dir));
    let store = PayrollStore::open(&args.database)
        .with_context(|| format!("Failed to open {}", args.database.display()))?;
    let initial = GeneralSettings {
        current_period: args
            .initial_period
            .unwrap_or_else(|| Period::from_date(Utc::now().date_naive())),
        license_expiry: args.license_expiry,
    };
    let service = PayrollService::new(store, config, initial, &report_dir)
        .context("Failed to initialise the payroll service")?;
    info!(
        state = ?service.period_state().context("Failed to read the open period")?,
        report_dir = %report_dir.display(),
        "Payroll service ready"
    );

    let app = create_router(AppState::new(service));
    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .context("Failed to bind to address")?;
    info!(addr = %args.listen, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
