//! # Validate Command Implementation
//!
//! This module implements `validate config`, which resolves a `furyctl.yaml`
//! against its distribution and reports schema violations.
//!
//! ## Functionality
//!
//! - **Distribution Acquisition**: fetches the distribution bundle through the
//!   protocol fallback client, served from the download cache unless
//!   `--no-cache` is given.
//! - **Defaulting**: fills the configuration from the distribution defaults.
//! - **Schema Validation**: prints one block per diagnostic with the file,
//!   the JSON pointer, the offending value and the validator message.
//!
//! The command exits non-zero when the configuration has diagnostics.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use furyctl::cache::{CachingFetcher, DownloadCache};
use furyctl::distribution::DistributionResolver;
use furyctl::fetch::{Fetcher, Getter, ProtocolFallbackClient};
use furyctl::output::{emoji, render_diagnostics, OutputConfig};
use furyctl::settings::FetchSettings;

/// Validate configuration files
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(subcommand)]
    pub command: ValidateSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ValidateSubcommand {
    /// Validate a furyctl.yaml against its distribution schema
    Config(ConfigArgs),
}

/// Arguments for `validate config`
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Path to the configuration file to validate.
    #[arg(short, long, value_name = "FILE", default_value = "furyctl.yaml")]
    pub config: PathBuf,

    /// Where to fetch the distribution from.
    ///
    /// Defaults to the public distribution repository at the configuration's
    /// `spec.distributionVersion`.
    #[arg(long, value_name = "SOURCE")]
    pub distro_location: Option<String>,

    /// Write the configuration with defaults applied to this file.
    ///
    /// Mapping keys are written in sorted order, so the original key order
    /// and any comments are not preserved.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Always download the distribution, bypassing the cache.
    #[arg(long)]
    pub no_cache: bool,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, cache_root: &Path, color_flag: &str) -> Result<()> {
    match args.command {
        ValidateSubcommand::Config(config_args) => execute_config(config_args, cache_root, color_flag),
    }
}

fn execute_config(args: ConfigArgs, cache_root: &Path, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    println!(
        "{} Validating configuration: {}",
        emoji(&out, "🔍", "[SCAN]"),
        args.config.display()
    );

    let settings = FetchSettings::default();
    let getter = Getter::new(settings.clone()).context("Failed to initialise the downloader")?;
    let client = ProtocolFallbackClient::new(getter, settings.protocols);
    let fetcher: Box<dyn Fetcher> = if args.no_cache {
        Box::new(client)
    } else {
        Box::new(CachingFetcher::new(client, Arc::new(DownloadCache::new(cache_root))))
    };

    let workdir = tempfile::tempdir().context("Failed to create a working directory")?;
    let resolution = DistributionResolver::new(fetcher)
        .resolve(&args.config, args.distro_location.as_deref(), workdir.path())
        .with_context(|| format!("Failed to resolve {}", args.config.display()))?;

    if let Some(output) = &args.output {
        let rendered = serde_yaml::to_string(resolution.config.root())?;
        fs::write(output, rendered)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!(
            "{} Wrote defaulted configuration to {}",
            emoji(&out, "📝", "[OUT]"),
            output.display()
        );
    }

    if resolution.is_valid() {
        println!(
            "{} Configuration is valid for distribution {}",
            emoji(&out, "✅", "[OK]"),
            resolution.manifest.version
        );
        return Ok(());
    }

    let config_file = args.config.display().to_string();
    print!("{}", render_diagnostics(&out, &config_file, &resolution.diagnostics));
    anyhow::bail!(
        "{} has {} validation error(s)",
        config_file,
        resolution.diagnostics.len()
    )
}
