mod cli;
mod commands;
mod observability;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use tiercache::TieredCache;
use tiercache::config::loader::load_config;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    // Optional .env for local development
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing(&cli.log_level);

    // Needs no connection
    if let Commands::Derive(args) = &cli.command {
        commands::cache::derive(args.ttl_secs);
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())
        .map_err(anyhow::Error::msg)
        .context("Configuration error")?;
    tracing::debug!(prefix = %config.prefix, url = %config.redis.url, "Configuration loaded");

    // Constructed once here and handed to the command by reference.
    let cache = TieredCache::connect(&config)
        .await
        .context("Failed to start tiered cache")?;

    let result = match &cli.command {
        Commands::Ping => commands::cache::ping(&cache).await,
        Commands::Get(args) => commands::cache::get(&cache, &args.key).await,
        Commands::Set(args) => {
            commands::cache::set(&cache, &args.key, &args.value, args.ttl_secs).await
        }
        Commands::Del(args) => commands::cache::del(&cache, &args.key).await,
        Commands::Flush => commands::cache::flush(&cache).await,
        Commands::Derive(_) => Ok(()),
    };

    cache.shutdown();
    result
}
