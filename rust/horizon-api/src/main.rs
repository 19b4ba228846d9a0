//! Horizon API - Main Entry Point
//!
//! A single-binary Rust service for the Horizon wellness platform:
//! missions, daily pulse, rewards, and the AI mentor.

use clap::Parser;
use mimalloc::MiMalloc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use horizon_api::config::AppConfig;
use horizon_api::server::create_app;

// Use mimalloc for better performance
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "horizon-api")]
#[command(about = "Horizon API - missions, daily pulse, and AI mentor")]
#[command(version)]
struct Args {
    /// Host to bind to.
    #[arg(long, env = "HORIZON_API_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "HORIZON_API_PORT", default_value = "8080")]
    port: u16,

    /// Log level.
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    /// Config file path.
    #[arg(short, long, env = "HORIZON_API_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize tracing
    init_tracing(&args.log_level);

    tracing::info!("Starting Horizon API v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::load()?;
    tracing::info!("Configuration loaded");

    // Create the application
    let app = create_app(config).await?;
    tracing::info!("Application initialized");

    let addr = format!("{}:{}", args.host, args.port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    // Run the server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Initialize tracing/logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
