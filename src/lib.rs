pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
pub use config::Config;
use db::Store;
use services::{SeaOrmTokenService, SessionSweeper, TokenService};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Entry point shared by the binary: sets up logging and metrics, then
/// dispatches the CLI subcommand.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.command == Some(Commands::Init) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("config.toml already exists, leaving it untouched.");
        }
        return Ok(());
    }

    config.validate()?;
    init_tracing(&config)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,
        Commands::Promote { email } => cmd_promote(&config, &email).await,
        Commands::Sweep => cmd_sweep(&config).await,
        Commands::Init => Ok(()),
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "kitchen-nerd")?
            .extra_field("env", "production")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

fn init_metrics(
    config: &Config,
) -> anyhow::Result<Option<metrics_exporter_prometheus::PrometheusHandle>> {
    if !config.observability.metrics_enabled {
        return Ok(None);
    }

    use metrics_exporter_prometheus::PrometheusBuilder;
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics recorder initialized");
    Ok(Some(handle))
}

async fn open_store(config: &Config) -> anyhow::Result<Store> {
    Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!(
        "Kitchen Nerd v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let prometheus_handle = init_metrics(&config)?;
    let store = open_store(&config).await?;
    let address = config.server.address.clone();
    let security = config.security.clone();

    let state = api::create_app_state(config, store, prometheus_handle)?;

    let sweeper = SessionSweeper::new(Arc::clone(&state.token_service), security);
    let mut scheduler = sweeper.start().await?;

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!("🌐 Web Server running at http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    if let Some(sched) = scheduler.as_mut()
        && let Err(e) = sched.shutdown().await
    {
        error!("Failed to stop session sweep: {}", e);
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

async fn cmd_promote(config: &Config, email: &str) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let state = api::create_app_state(config.clone(), store, None)?;

    match state.users().promote(email).await {
        Ok(()) => {
            println!("✓ {email} is now an admin");
            Ok(())
        }
        Err(services::UserError::NotFound) => {
            println!("No user registered with email {email}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn cmd_sweep(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let tokens: Arc<dyn TokenService> = Arc::new(SeaOrmTokenService::new(
        store,
        config.security.session_ttl()?,
    ));

    let deleted = SessionSweeper::new(tokens, config.security.clone())
        .run_once()
        .await?;

    println!("✓ Deleted {deleted} expired session(s)");
    Ok(())
}
