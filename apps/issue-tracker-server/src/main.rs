use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use api_ingress::{ApiIngress, ApiIngressConfig};
use clap::{Parser, Subcommand};
use issue_tracker::IssueTracker;
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Issue Tracker Server - per-project issue tracking over HTTP
#[derive(Parser)]
#[command(name = "issue-tracker-server")]
#[command(about = "Issue Tracker Server - per-project issue tracking over HTTP")]
#[command(version)]
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

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Issue Tracker Server starting");
    tracing::debug!(?config.server, "Effective server configuration");

    if args.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
    }
}

/// Ingress settings with the process-wide fallbacks applied.
fn ingress_config(config: &AppConfig) -> Result<ApiIngressConfig> {
    let mut cfg: ApiIngressConfig = config.module_config("api_ingress")?;
    if cfg.request_timeout_sec.is_none() && config.server.timeout_sec > 0 {
        cfg.request_timeout_sec = Some(config.server.timeout_sec);
    }
    Ok(cfg.with_default_bind(&config.server.host, config.server.port))
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Initializing modules...");

    let ingress = Arc::new(ApiIngress::new(ingress_config(&config)?));
    let issues = IssueTracker::default();
    ingress.register_openapi(issues.openapi());

    let routes = issues.register_rest(axum::Router::new());
    let router = ingress.build_router(routes)?;

    let cancel = runtime::shutdown::shutdown_token();
    ingress.serve(router, cancel, None).await?;

    tracing::info!("Issue Tracker Server stopped");
    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    // Module sections must deserialize into their typed configs
    let ingress = ingress_config(&config)?;
    tracing::debug!(bind_addr = ?ingress.bind_addr, "api_ingress config is valid");

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);

    Ok(())
}
