//! # Vendor Command Implementation
//!
//! Downloads the packages listed in a `Furyfile.yml` into the vendor
//! directory, using the mirrored package downloader.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use furyctl::config::Furyfile;
use furyctl::defaults::VENDOR_DIR;
use furyctl::fetch::Getter;
use furyctl::output::{emoji, OutputConfig};
use furyctl::settings::{DownloaderSettings, FetchSettings};
use furyctl::vendor::{HttpProbe, PackageDownloader, PackageResolver};

/// Download Furyfile packages into the vendor directory
#[derive(Args, Debug)]
pub struct VendorArgs {
    /// Path to the Furyfile.
    #[arg(short = 'F', long, value_name = "FILE", default_value = "Furyfile.yml")]
    pub furyfile: PathBuf,

    /// Only download packages whose name starts with this prefix.
    #[arg(short = 'P', long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Download over HTTPS instead of SSH.
    #[arg(short = 'H', long)]
    pub https: bool,

    /// Maximum number of concurrent downloads.
    #[arg(long, value_name = "N")]
    pub parallel: Option<usize>,

    /// Directory packages are written to.
    #[arg(long, value_name = "DIR", default_value = VENDOR_DIR)]
    pub vendor_dir: PathBuf,
}

/// Execute the `vendor` command.
pub fn execute(args: VendorArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let furyfile = Furyfile::from_file(&args.furyfile)?;
    let mut settings = DownloaderSettings::default().with_https(args.https);
    if let Some(parallel) = args.parallel {
        settings = settings.with_parallelism(parallel);
    }

    let packages = PackageResolver::new(&furyfile, &args.vendor_dir, &settings.prefixes().primary)
        .resolve(args.prefix.as_deref())
        .with_context(|| format!("Failed to resolve packages from {}", args.furyfile.display()))?;

    if packages.is_empty() {
        println!("{} No packages to download", emoji(&out, "ℹ️ ", "[INFO]"));
        return Ok(());
    }
    println!(
        "{} Downloading {} packages into {}",
        emoji(&out, "📦", "[VENDOR]"),
        packages.len(),
        args.vendor_dir.display()
    );

    let getter = Getter::new(FetchSettings {
        timeout: settings.timeout,
        ..FetchSettings::default()
    })?;
    let probe = HttpProbe::new(&settings.api_base, settings.token.clone(), settings.timeout)?;
    PackageDownloader::new(getter, probe, settings).download(&packages)?;

    println!(
        "{} Vendored {} packages",
        emoji(&out, "✅", "[OK]"),
        packages.len()
    );
    Ok(())
}
