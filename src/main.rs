use std::{path::Path, sync::Arc};

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use gangway::{
    adapters::{GatewayServer, HttpClientAdapter},
    config::{GatewayConfig, GatewayConfigValidator, load_config},
    ports::{http_client::HttpClient, http_server::HttpServer},
    tracing_setup::{self, LogFormat},
    utils::GracefulShutdown,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "config.json")]
    config: String,

    /// Log output format: json or pretty
    #[clap(long, default_value = "json", global = true)]
    log_format: LogFormat,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "config.json")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "config.json")]
        config: String,
    },
    /// Start the gateway server (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "config.json")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { config }) => validate_config_command(&config).await,
        Some(Commands::Init { config }) => init_config_command(&config).await,
        Some(Commands::Serve { config }) => serve(&config, args.log_format).await,
        None => serve(&args.config, args.log_format).await,
    }
}

/// Load, validate and serve. Every configuration error returns before the
/// listener is bound, so the process exits non-zero without serving.
async fn serve(config_path: &str, log_format: LogFormat) -> Result<()> {
    tracing_setup::init_tracing(log_format)
        .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;

    tracing::info!("Loading configuration from {config_path}");

    let config = load_config(config_path)
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;

    GatewayConfigValidator::validate(&config)
        .with_context(|| format!("Invalid configuration in {config_path}"))?;
    for warning in GatewayConfigValidator::warnings(&config) {
        tracing::warn!("{}", warning);
    }

    let config = Arc::new(config);
    let http_client: Arc<dyn HttpClient> =
        Arc::new(HttpClientAdapter::new().context("Failed to create HTTP client adapter")?);

    let graceful_shutdown = Arc::new(GracefulShutdown::new());
    let server = GatewayServer::from_config(config, http_client, graceful_shutdown.clone())?;

    tracing::info!(
        "Starting Gangway on {} with {} route(s), request timeout {}",
        server.config().listen_addr(),
        server.config().routes.len(),
        server.config().request_timeout
    );

    let signal_handler_shutdown = graceful_shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signal_handler_shutdown.run_signal_handler().await {
            tracing::error!("Signal handler error: {}", e);
        }
    });

    server.run().await?;

    tracing::info!("Graceful shutdown completed");
    Ok(())
}

/// Validate configuration file and exit
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(config_path).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e:#}");
            std::process::exit(1);
        }
    };

    match GatewayConfigValidator::validate(&config) {
        Ok(()) => {
            println!("✅ Configuration validation: OK");
            for warning in GatewayConfigValidator::warnings(&config) {
                println!("⚠️  {warning}");
            }
            println!();
            println!("📋 Configuration Summary:");
            println!("   • Listen Address: {}", config.listen_addr());
            println!("   • Request Timeout: {}", config.request_timeout);
            println!("   • Routes: {}", config.routes.len());
            for route in &config.routes {
                println!("     - {} -> {}", route.path, route.target);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("{e}");
            println!();
            println!("💡 Common fixes:");
            println!("   • Ensure every target is an absolute http:// or https:// URL");
            println!("   • Route paths start with '/' and only end in '/*' for prefixes");
            println!("   • Port is a number between 0 and 65535");
            std::process::exit(1);
        }
    }
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = GatewayConfig::builder()
        .port("8080")
        .route("/api/user/*", "http://localhost:5202")
        .route("/api/wallet/*", "http://localhost:5201")
        .build();
    let contents = serde_json::to_string_pretty(&default_config)
        .context("Failed to serialize default config")?;

    tokio::fs::write(path, contents)
        .await
        .context("Failed to write config file")?;
    println!("✅ Created default configuration at: {config_path}");
    println!("   Run 'gangway serve --config {config_path}' to start the gateway");
    Ok(())
}
