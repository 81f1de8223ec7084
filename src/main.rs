//! chanircd - Main binary

use chanircd_core::{CommandRouter, Config, Registry};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// chanircd - IRC channel core
#[derive(Parser)]
#[command(name = "chanircd")]
#[command(about = "Channel state and channel commands for an IRC server")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "chanircd.toml")]
    config: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Test configuration and exit
    #[arg(long)]
    test_config: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a default configuration file
    Config {
        /// Output file path
        #[arg(short, long, default_value = "chanircd.toml")]
        output: PathBuf,
    },
    /// Show server information
    Info,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    if let Some(command) = cli.command {
        match command {
            Commands::Config { output } => {
                generate_config(&output)?;
                return Ok(());
            }
            Commands::Info => {
                show_info();
                return Ok(());
            }
            Commands::Version => {
                show_version();
                return Ok(());
            }
        }
    }

    let config = if cli.config.exists() {
        info!("Loading configuration from {:?}", cli.config);
        Config::from_file(&cli.config)?
    } else {
        info!("Configuration file not found, using defaults");
        Config::default()
    };

    config.validate()?;
    if cli.test_config {
        info!("Configuration is valid");
        return Ok(());
    }

    let registry = Arc::new(Registry::new(Arc::new(config)));
    let router = CommandRouter::new(registry.clone());

    info!(
        "Channel core ready on {} (default modes +{}, mailbox capacity {}, overflow {:?})",
        registry.server_name(),
        registry.config().channels.default_modes,
        registry.config().mailbox.capacity,
        registry.config().mailbox.overflow,
    );

    tokio::signal::ctrl_c().await?;
    warn!("Shutting down, {} clients connected", registry.client_count());

    for id in registry.client_ids() {
        router.disconnect(id, "Server shutting down");
    }

    Ok(())
}

/// Initialize logging
fn init_logging(level: &str) -> anyhow::Result<()> {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .init();

    Ok(())
}

/// Generate default configuration file
fn generate_config(output: &Path) -> anyhow::Result<()> {
    let config = Config::default();
    config.to_file(output)?;
    println!("Generated default configuration file: {:?}", output);
    Ok(())
}

/// Show server information
fn show_info() {
    println!("chanircd");
    println!("========");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Description: {}", env!("CARGO_PKG_DESCRIPTION"));
    println!("Repository: {}", env!("CARGO_PKG_REPOSITORY"));
    println!("License: {}", env!("CARGO_PKG_LICENSE"));
    println!();
    println!("Commands:");
    println!("  JOIN, PART, MODE (channel), TOPIC, NAMES, PRIVMSG, NOTICE");
    println!();
    println!("Channel modes: o p s i t n m l b v k");
}

/// Show version information
fn show_version() {
    println!("chanircd {}", env!("CARGO_PKG_VERSION"));
}
