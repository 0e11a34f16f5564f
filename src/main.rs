//! Portfolio Gateway
//!
//! Serves a brokerage account's portfolio as a read-only JSON resource.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                 PORTFOLIO GATEWAY                │
//!                      │                                                  │
//!   Client Request     │  ┌─────────┐   ┌──────────┐   ┌──────────────┐   │
//!   ───────────────────┼─▶│  http   │──▶│ security │──▶│  portfolio   │   │
//!                      │  │ server  │   │ (profile)│   │   service    │   │
//!                      │  └─────────┘   └──────────┘   └──────┬───────┘   │
//!                      │                                      │           │
//!                      │                                      ▼           │
//!   Client Response    │  ┌─────────┐                  ┌──────────────┐   │
//!   ◀──────────────────┼──│  error  │◀─────────────────│ upstream     │◀──┼── Brokerage
//!                      │  │ mapping │                  │ client       │   │   REST API
//!                      │  └─────────┘                  └──────────────┘   │
//!                      │                                                  │
//!                      │   config · observability · lifecycle · net       │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use portfolio_gateway::config::{
    load_env_file, validate_config, ConfigError, DeploymentProfile, GatewayConfig,
};
use portfolio_gateway::http::HttpServer;
use portfolio_gateway::lifecycle::{wait_for_signal, Shutdown};
use portfolio_gateway::net::load_tls_config;
use portfolio_gateway::observability::{logging, metrics};
use portfolio_gateway::portfolio::{HttpPortfolioClient, PortfolioProvider};

#[derive(Parser)]
#[command(name = "portfolio-gateway", version)]
#[command(about = "Read-only HTTP gateway for brokerage portfolio data", long_about = None)]
struct Cli {
    /// Env file to load instead of `./.env`
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Deployment profile (bare, local, hardened); overrides GATEWAY_PROFILE
    #[arg(short, long)]
    profile: Option<String>,

    /// Print the effective configuration (secrets redacted) and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    load_env_file(cli.env_file.as_deref())?;

    if let Some(raw) = &cli.profile {
        if DeploymentProfile::parse(raw).is_none() {
            return Err(format!("unknown profile {:?}: expected bare, local or hardened", raw).into());
        }
    }

    let config = GatewayConfig::from_lookup(|key| match (key, &cli.profile) {
        ("GATEWAY_PROFILE", Some(profile)) => Some(profile.clone()),
        _ => std::env::var(key).ok(),
    })?;

    if cli.check_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return match validate_config(&config) {
            Ok(()) => Ok(()),
            Err(errors) => Err(ConfigError::Validation(errors).into()),
        };
    }

    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        profile = config.profile.as_str(),
        "portfolio-gateway starting"
    );

    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            tracing::error!(%error, "Invalid configuration");
        }
        return Err(ConfigError::Validation(errors).into());
    }

    tracing::info!(
        bind_address = %config.server.bind_addr(),
        environment = ?config.environment,
        upstream = %config.upstream.base_url,
        error_exposure = ?config.security.error_exposure,
        tls = config.server.tls().is_some(),
        "Configuration loaded"
    );

    if let Some(addr) = config.observability.metrics_address {
        metrics::init_metrics(addr)?;
    }

    let provider: Arc<dyn PortfolioProvider> = Arc::new(HttpPortfolioClient::new(&config.upstream)?);

    let shutdown = Shutdown::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        let receivers = signal_shutdown.trigger();
        tracing::info!(receivers, "Shutdown initiated");
    });

    let bind_addr = config.server.bind_addr();
    let tls = config.server.tls();
    let server = HttpServer::new(config, provider);

    match tls {
        Some(paths) => {
            let tls_config = load_tls_config(&paths).await?;
            server
                .run_tls(bind_addr, tls_config, shutdown.subscribe())
                .await?;
        }
        None => {
            let listener = TcpListener::bind(bind_addr).await?;
            server.run(listener, shutdown.subscribe()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
