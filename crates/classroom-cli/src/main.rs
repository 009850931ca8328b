//! Classroom Coordinator CLI
//!
//! Main entry point for running the classroom coordination server.

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use classroom_assist::Assistant;
use classroom_coordinator::{create_router, AppState, Config, Coordinator};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Classroom Coordinator - Live Classroom Server
///
/// Routes lecture summaries and quick polls between teachers and students
/// over WebSockets, tracks per-student focus, and aggregates answer
/// statistics for the teacher dashboard.
#[derive(Parser, Debug)]
#[command(name = "classroom")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: classroom.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Port for the HTTP and WebSocket server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing subscriber with appropriate filter
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Classroom coordinator starting");
    tracing::debug!(config = ?args.config, "Config file");

    match run_server(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Runs the coordination server.
///
/// 1. Load config and apply CLI overrides
/// 2. Start the background focus sweep
/// 3. Serve the HTTP API and WebSocket endpoint until Ctrl+C
async fn run_server(args: Args) -> anyhow::Result<()> {
    // Load configuration
    let mut config = load_config(args.config.as_deref())?;

    // Apply CLI argument overrides
    if let Some(port) = args.port {
        config.port = port;
    }

    // Re-validate after overrides
    config.validate()?;

    print_config(&config);

    let coordinator = Arc::new(Coordinator::new(config.clone()));

    // Background task that decays focus scores for idle students
    let sweep_handle = coordinator.spawn_focus_sweep();

    let app_state = AppState::with_parts(Arc::clone(&coordinator), Arc::new(Assistant::scripted()));
    let router = create_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| {
            anyhow::anyhow!(
                "Invalid bind address {}:{}: {e}\n\nSuggestion: Use an IP address for host, e.g. 0.0.0.0",
                config.host,
                config.port
            )
        })?;

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    println!();
    println!("Server running on http://{addr}");
    println!("WebSocket available on ws://{addr}/ws");
    println!("Press Ctrl+C to stop");
    println!();

    tokio::select! {
        result = axum::serve(listener, router) => {
            result.map_err(|e| anyhow::anyhow!("HTTP server error: {e}"))?;
        }
        Ok(()) = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
    }

    sweep_handle.abort();
    println!("Server stopped");

    Ok(())
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Prints the loaded configuration.
fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Bind address: {}:{}", config.host, config.port);
    println!("  Focus trigger threshold: {}", config.focus.trigger_threshold);
    println!("  Focus sweep interval: {}s", config.focus.sweep_interval_secs);
    println!("  Answer log limit: {}", config.answer_log_limit);
    println!("  Summary history limit: {}", config.summary_history_limit);
}
