//! Courier CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use courier_config::{load_config, validate_config, Config};
use courier_runtime::{ServerBuilder, SignalHandler};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "courier")]
#[command(about = "Authenticated HTTP forwarding proxy", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the proxy server
    Serve {
        /// Path to configuration file (YAML, TOML or JSON)
        #[arg(short, long, env = "COURIER_CONFIG")]
        config: Option<PathBuf>,

        /// Address to listen on, overrides the configuration
        #[arg(long, env = "COURIER_LISTEN")]
        listen: Option<SocketAddr>,

        /// Log level (trace, debug, info, warn, error)
        #[arg(short, long, default_value = "info", env = "COURIER_LOG_LEVEL")]
        log_level: String,

        /// Log output format
        #[arg(long, value_enum, default_value_t = LogFormat::Text)]
        log_format: LogFormat,
    },

    /// Validate configuration without starting the server
    Validate {
        /// Path to configuration file (YAML, TOML or JSON)
        #[arg(short, long, env = "COURIER_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            listen,
            log_level,
            log_format,
        } => {
            init_tracing(&log_level, log_format)?;

            tracing::info!("Starting Courier");
            if let Some(path) = &config {
                tracing::info!("Config file: {}", path.display());
            }

            let config = load(config, listen)?;

            tracing::info!(
                listen = %config.gateway.listen,
                request_timeout_ms = config.gateway.request_timeout.as_millis(),
                "Configuration loaded"
            );

            let server = ServerBuilder::new().config(config).build()?;

            let shutdown_signal = server.shutdown_signal();
            tokio::spawn(async move {
                SignalHandler::new(shutdown_signal).run().await;
            });

            server.run().await?;

            tracing::info!("Courier stopped");
            Ok(())
        }

        Commands::Validate { config } => {
            tracing_subscriber::fmt().with_target(false).init();

            match load(config, None) {
                Ok(cfg) => {
                    tracing::info!("Configuration is valid");
                    tracing::info!("  Listen: {}", cfg.gateway.listen);
                    tracing::info!(
                        "  Request timeout: {}ms",
                        cfg.gateway.request_timeout.as_millis()
                    );
                    tracing::info!(
                        "  Max response bytes: {}",
                        cfg.proxy.max_response_bytes
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("Configuration validation failed: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Version => {
            println!("Courier forwarding proxy");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(())
        }
    }
}

/// Load file and environment, then apply flags on top
fn load(path: Option<PathBuf>, listen: Option<SocketAddr>) -> Result<Config> {
    let mut config = load_config(path.as_deref()).context("Failed to load configuration")?;

    if let Some(addr) = listen {
        config.gateway.listen = addr;
        validate_config(&config)?;
    }

    Ok(config)
}

fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let filter = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(filter.into())
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_level(true),
            )
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
    }

    Ok(())
}
