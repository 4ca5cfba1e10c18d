use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use clap::{Parser, Subcommand};
use marketplace::{config::MarketplaceConfig, Marketplace};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
};

mod db;
mod shutdown;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MODULE_NAME: &str = "marketplace";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Campus Market Server - hosts the marketplace Bridge
#[derive(Parser)]
#[command(name = "market-server")]
#[command(about = "Campus Market Server - hosts the marketplace Bridge")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
    /// Apply database migrations and exit
    Migrate,
    /// Promote the account registered under an email to admin
    GrantAdmin {
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Campus Market Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config),
        Commands::Migrate => migrate(config, args).await,
        Commands::GrantAdmin { email } => grant_admin(config, args, &email).await,
    }
}

async fn open_db(config: &AppConfig, args: &CliArgs) -> Result<sea_orm::DatabaseConnection> {
    let db_config = config
        .database
        .as_ref()
        .ok_or_else(|| anyhow!("No database configuration found"))?;
    let conn = db::connect(db_config, &config.home_dir(), args.mock).await?;
    Marketplace::migrate(&conn).await?;
    Ok(conn)
}

fn marketplace_config(config: &AppConfig) -> Result<MarketplaceConfig> {
    config.module_config(MODULE_NAME)
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");
    let module_cfg = marketplace_config(&config)?;
    let cors_enabled = module_cfg.cors_enabled;

    let conn = open_db(&config, &args).await?;
    let market = Marketplace::new(module_cfg);
    market.init(conn);

    let router = Router::new().route("/healthz", get(|| async { "ok" }));
    let router = market.register_rest(router)?;

    let timeout = match config.server.timeout_sec {
        0 => DEFAULT_TIMEOUT_SECS,
        secs => secs,
    };
    let mut router = router
        .layer(TimeoutLayer::new(Duration::from_secs(timeout)))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES));
    if cors_enabled {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, httpkit::request_id::header()]),
        );
    }
    let router = httpkit::request_id::with_request_tracing(router);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address '{}:{}'",
                config.server.host, config.server.port
            )
        })?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server bound on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = shutdown::wait_for_shutdown().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signals");
            }
            tracing::info!("HTTP server shutting down gracefully");
        })
        .await
        .map_err(|e| anyhow!(e))
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    if let Some(db_config) = &config.database {
        db::detect_backend(&db_config.url)?;
    }
    marketplace_config(&config)?;
    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn migrate(config: AppConfig, args: CliArgs) -> Result<()> {
    open_db(&config, &args).await?;
    println!("Migrations applied");
    Ok(())
}

async fn grant_admin(config: AppConfig, args: CliArgs, email: &str) -> Result<()> {
    let conn = open_db(&config, &args).await?;
    let market = Marketplace::new(marketplace_config(&config)?);
    market.init(conn);

    let account = market
        .service()?
        .grant_admin_by_email(email)
        .await
        .map_err(|e| anyhow!(e))?;
    println!("{} ({}) is now {}", account.email, account.id, account.role);
    Ok(())
}
