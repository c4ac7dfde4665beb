mod http;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use socckit::signals::cancel_on_shutdown;
use socckit::{AppConfig, CliArgs};
use socctrader::AppServices;
use socctrader::config::SocctraderConfig;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// How long a stopping server waits for queued index work.
const DRAIN_GRACE: Duration = Duration::from_secs(10);

/// How long `reconcile` waits for its repairs to land.
const RECONCILE_GRACE: Duration = Duration::from_secs(120);

/// SocCTrader Server - football records with full-text search
#[derive(Parser)]
#[command(name = "socctrader-server")]
#[command(about = "SocCTrader Server - football records with full-text search")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database (sqlite::memory:)
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
    /// Run one store/index reconciliation pass, wait for it to land and print the report
    Reconcile,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().into_owned()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // defaults -> YAML (if provided) -> env (SOCCTRADER__*) -> CLI overrides
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    socckit::logging::init_logging(&config.logging);
    tracing::info!("SocCTrader Server starting");

    if cli.print_config {
        println!("Effective configuration:\n{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
        Commands::Reconcile => reconcile_once(config).await,
    }
}

fn bind_addr(config: &AppConfig) -> Result<SocketAddr> {
    config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.server.bind_addr))
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    bind_addr(config)?;

    let module: SocctraderConfig = config.module_config_or_default(socctrader::MODULE_NAME)?;
    module
        .validate()
        .map_err(|msg| anyhow::anyhow!("invalid socctrader config: {msg}"))?;

    println!("Configuration is valid");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    let addr = bind_addr(&config)?;

    // The coordinator gets its own token so queued index work can drain
    // after the HTTP server has stopped.
    let services = AppServices::build(&config, CancellationToken::new()).await?;

    let shutdown = CancellationToken::new();
    cancel_on_shutdown(shutdown.clone());

    // Retries in the background until one pass succeeds; stops on shutdown.
    let startup = services.clone();
    let startup_cancel = shutdown.clone();
    tokio::spawn(async move {
        if let Some(report) = startup.reconcile_with_retry(&startup_cancel).await {
            tracing::info!(repairs = report.repairs(), "startup reconciliation queued");
        }
    });

    let router = http::with_middleware(services.router(), &config.server);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("HTTP server bound on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully");
        })
        .await
        .context("HTTP server failed")?;

    if !services.drain(DRAIN_GRACE).await {
        tracing::warn!("index work left behind; the next reconciliation will repair it");
    }
    Ok(())
}

async fn reconcile_once(config: AppConfig) -> Result<()> {
    let services = AppServices::build(&config, CancellationToken::new()).await?;

    let report = services.reconcile().await.context("reconciliation failed")?;
    let drained = services.drain(RECONCILE_GRACE).await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if !drained {
        anyhow::bail!(
            "index did not absorb the repairs within {}s",
            RECONCILE_GRACE.as_secs()
        );
    }
    Ok(())
}
