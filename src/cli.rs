//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;
use furyctl::defaults;

/// furyctl - Acquire Kubernetes Fury distributions and resolve cluster configuration
#[derive(Parser, Debug)]
#[command(name = "furyctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Download cache directory
    #[arg(long, global = true, value_name = "DIR", env = "FURYCTL_CACHE")]
    cache_root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate configuration against the distribution schema
    Validate(commands::validate::ValidateArgs),

    /// Download Furyfile packages into the vendor directory
    Vendor(commands::vendor::VendorArgs),

    /// Manage the download cache
    Cache(commands::cache::CacheArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // RUST_LOG still wins over --log-level when set.
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.log_level.as_str()),
        )
        .format_timestamp(None)
        .try_init();

        let cache_root = self.cache_root.unwrap_or_else(defaults::default_cache_root);

        match self.command {
            Commands::Validate(args) => commands::validate::execute(args, &cache_root, &self.color),
            Commands::Vendor(args) => commands::vendor::execute(args, &self.color),
            Commands::Cache(args) => commands::cache::execute(args, &cache_root),
        }
    }
}
