use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rdo_dailies::config::Config;
use rdo_dailies::cycle::PublishCycle;
use rdo_dailies::delivery::HttpChannel;
use rdo_dailies::i18n::available_locales;
use rdo_dailies::storage::DestinationRegistry;

#[derive(Parser)]
#[command(
    name = "rdo-dailies",
    version,
    about = "Publishes the Red Dead Online daily challenges to chat channels",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (environment variables are used otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish every day until interrupted
    Run,

    /// Run a single publish cycle without waiting for the window
    Once,

    /// Register the channel receiving a guild's announcements
    Register {
        /// Guild id
        guild: u64,

        /// Channel id
        channel: u64,

        /// Rendering locale
        #[arg(short, long, default_value = "en")]
        locale: String,
    },

    /// Remove a guild's registration
    Unregister {
        /// Guild id
        guild: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate().context("Invalid configuration")?;

    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(log_format, &config.logging.level, cli.verbose)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rdo-dailies starting");

    let registry = Arc::new(
        DestinationRegistry::load(&config.storage.registry_path, available_locales())
            .await
            .context("Failed to load destination registry")?,
    );

    match cli.command {
        Commands::Run => {
            let mut cycle = build_cycle(&config, Arc::clone(&registry))?;
            tokio::select! {
                _ = cycle.run() => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, shutting down");
                }
            }
        }
        Commands::Once => {
            let mut cycle = build_cycle(&config, Arc::clone(&registry))?;
            tokio::select! {
                report = cycle.run_cycle() => {
                    println!(
                        "{}: delivered to {}, {} failed{}",
                        report.date,
                        report.delivered.len(),
                        report.failed.len(),
                        if report.reused_cache { " (cached)" } else { "" }
                    );
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, shutting down");
                }
            }
        }
        Commands::Register {
            guild,
            channel,
            locale,
        } => {
            registry.register(guild, channel, &locale).await?;
            println!("Guild {guild} now receives announcements in channel {channel} ({locale})");
        }
        Commands::Unregister { guild } => {
            if registry.remove_guild(guild).await? {
                println!("Guild {guild} removed");
            } else {
                println!("Guild {guild} was not registered");
            }
        }
    }

    Ok(())
}

fn build_cycle(config: &Config, registry: Arc<DestinationRegistry>) -> Result<PublishCycle> {
    let channel = HttpChannel::new(&config.delivery).context("Invalid delivery configuration")?;
    let cycle = PublishCycle::from_config(config, registry, Arc::new(channel))?;
    Ok(cycle)
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("rdo_dailies=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("rdo_dailies={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
