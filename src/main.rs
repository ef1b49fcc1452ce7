//! Imagery Fetcher CLI application
//!
//! Command-line interface for building a yearly time series of least-cloudy
//! satellite images of one region, plus the manifest a slider viewer reads.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use imagery_fetcher::cli::{
    handle_auth, handle_config, handle_fetch, handle_manifest, Cli, Commands, ConfigAction,
    ConfigArgs,
};
use imagery_fetcher::config::AppConfig;
use imagery_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    // `config init` must work even when the existing file is broken
    let config = match &cli.command {
        Commands::Config(ConfigArgs {
            action: ConfigAction::Init { .. },
        }) => None,
        _ => Some(AppConfig::load(cli.global.config.clone()).await?),
    };

    init_logging(&cli, config.as_ref());

    info!("Imagery Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    let quiet = cli.global.quiet;
    let config_override = cli.global.config.clone();
    let loaded = config.unwrap_or_default();

    match cli.command {
        Commands::Fetch(args) => {
            info!("Executing fetch command");
            handle_fetch(args, &loaded, quiet).await
        }
        Commands::Manifest(args) => {
            info!("Executing manifest command");
            handle_manifest(args, &loaded).await
        }
        Commands::Auth(args) => {
            info!("Executing auth command");
            handle_auth(args, &loaded).await
        }
        Commands::Config(args) => {
            info!("Executing config command");
            let shown = match &args.action {
                ConfigAction::Init { .. } => None,
                ConfigAction::Show => Some(&loaded),
            };
            handle_config(args, shown, config_override).await
        }
    }
}

/// Initialize logging from CLI flags, falling back to the configured level
fn init_logging(cli: &Cli, config: Option<&AppConfig>) {
    let log_level = cli
        .explicit_log_level()
        .or_else(|| config.and_then(|c| c.logging.level.parse().ok()))
        .unwrap_or_else(|| cli.log_level());

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("imagery_fetcher={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
