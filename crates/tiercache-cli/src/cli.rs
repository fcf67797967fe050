use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tiercache")]
#[command(about = "Tiered cache CLI: inspect and manage an L1/Redis cache namespace")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (overrides TIERCACHE_CONFIG env var)
    #[arg(short, long, global = true, env = "TIERCACHE_CONFIG")]
    pub config: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that Redis is reachable
    Ping,
    /// Read a key (L1 first, then Redis)
    Get(GetArgs),
    /// Write a key to Redis and L1
    Set(SetArgs),
    /// Delete a key from both tiers
    Del(DelArgs),
    /// Delete every key in the configured namespace
    Flush,
    /// Show the L1 lifetime derived from a Redis lifetime (no connection)
    Derive(DeriveArgs),
}

#[derive(clap::Args)]
pub struct GetArgs {
    /// Key, without the namespace prefix
    pub key: String,
}

#[derive(clap::Args)]
pub struct SetArgs {
    /// Key, without the namespace prefix
    pub key: String,
    /// Value stored as UTF-8 bytes
    pub value: String,
    /// Redis lifetime in seconds (0 = no expiration)
    #[arg(long, default_value_t = 3600)]
    pub ttl_secs: u64,
}

#[derive(clap::Args)]
pub struct DelArgs {
    /// Key, without the namespace prefix
    pub key: String,
}

#[derive(clap::Args)]
pub struct DeriveArgs {
    /// Redis lifetime in seconds
    pub ttl_secs: u64,
}
