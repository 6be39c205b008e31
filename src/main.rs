//! Service entry point.
//!
//! # Architecture Overview
//!
//! ```text
//!   main
//!     │  .env → CLI → config → logging → metrics
//!     ▼
//!   App::start
//!     │  Bootstrapper: RegisterServices → SetupRequestPipeline
//!     │                → SetupRouting → SetupErrorHandling
//!     ▼
//!   ServerManager (axum::serve, graceful shutdown)
//!     │
//!   SIGINT / SIGTERM → App::stop → exit 0
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use service_template::config::load_config;
use service_template::lifecycle::wait_for_termination;
use service_template::observability::{logging, metrics};
use service_template::App;

#[derive(Debug, Parser)]
#[command(name = "service-template", version, about = "HTTP service scaffold")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "APP_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability, config.environment);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "service-template starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(err) = metrics::init_metrics(addr) {
                    tracing::error!(error = %err, "Failed to start metrics exporter");
                }
            }
            Err(err) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %err,
                "Failed to parse metrics address"
            ),
        }
    }

    let app = App::new(config);
    if let Err(err) = app.start().await {
        tracing::error!(error = %err, "Failed to start server");
        return ExitCode::FAILURE;
    }

    let exit = match wait_for_termination().await {
        Ok(signal) => {
            tracing::info!(signal, "Termination signal received, shutting down");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to install signal handlers");
            ExitCode::FAILURE
        }
    };

    app.stop().await;
    tracing::info!("Shutdown complete");
    exit
}
