//! CAQAO assessment server - Main entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caqao_common::config::TomlConfig;
use caqao_common::db::init_database;
use caqao_server::detector::{Detector, HttpDetector};
use caqao_server::public_url::{resolve_public_host, ImageUrls};
use caqao_server::{build_router, AppState, AssessmentSettings};

/// Command-line arguments for caqao-server
#[derive(Parser, Debug)]
#[command(name = "caqao-server")]
#[command(about = "Cacao bean cut-test assessment service")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "CAQAO_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "CAQAO_PORT")]
    port: Option<u16>,

    /// Interface to bind
    #[arg(long, env = "CAQAO_BIND_HOST")]
    bind_host: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "CAQAO_DATABASE")]
    database: Option<PathBuf>,

    /// Inference endpoint of the bean detector
    #[arg(long, env = "CAQAO_DETECTOR_URL")]
    detector_url: Option<String>,

    /// Host advertised in image URLs
    #[arg(long, env = "CAQAO_PUBLIC_HOST")]
    public_host: Option<String>,

    /// Maximum detections per image
    #[arg(long, env = "CAQAO_MAX_DET")]
    max_det: Option<u32>,
}

impl Args {
    /// Command-line and environment values override the config file
    fn apply(self, config: &mut TomlConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(bind_host) = self.bind_host {
            config.server.bind_host = bind_host;
        }
        if let Some(database) = self.database {
            config.database_path = database;
        }
        if let Some(url) = self.detector_url {
            config.detector.url = url;
        }
        if let Some(public_host) = self.public_host {
            config.server.public_host = Some(public_host);
        }
        if let Some(max_det) = self.max_det {
            config.detector.max_det = max_det;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, config_source) = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    // Initialize tracing; RUST_LOG wins over the configured level
    let level = &config.logging.level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "caqao_server={level},caqao_common={level},tower_http={level}"
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting CAQAO server v{} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );
    match &config_source {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => warn!("No config file found, using defaults"),
    }

    let db = init_database(&config.database_path)
        .await
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;
    info!("Database ready at {}", config.database_path.display());

    let detector: Arc<dyn Detector> =
        Arc::new(HttpDetector::new(&config.detector).context("Failed to build detector client")?);
    info!(
        "Detector: {} (max_det {}, size {})",
        config.detector.url, config.detector.max_det, config.detector.image_size
    );

    let public_host = resolve_public_host(
        config.server.public_host.as_deref(),
        &config.server.bind_host,
    );
    let image_urls = ImageUrls::new(&public_host, config.server.port);
    info!("Image URLs: {}", image_urls.image_url("<filename>"));

    let state = AppState::new(
        db,
        detector,
        AssessmentSettings {
            max_det: config.detector.max_det,
            image_urls,
            max_upload_bytes: config.server.max_upload_bytes,
        },
    );
    let app = build_router(state);

    let bind_host = config.server.bind_host.as_str();
    let port = config.server.port;
    info!("Starting HTTP server on {}:{}", bind_host, port);

    let listener = tokio::net::TcpListener::bind((bind_host, port))
        .await
        .context("Failed to bind to address")?;
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on {}", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
