//! Default values for furyctl configuration.
//!
//! This module provides centralized default values used across the fetch,
//! cache and vendoring layers, ensuring consistency and avoiding duplication.

use std::path::PathBuf;
use std::time::Duration;

/// Protocol prefixes tried, in order, for a source without an explicit one.
///
/// The empty prefix lets the getter auto-detect the protocol from the source.
pub const PROTOCOLS: [&str; 7] = [
    "", "git::", "file::", "http::", "s3::", "gcs::", "mercurial::",
];

/// Upper bound for any single fetch, probe or subprocess.
pub const OPERATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Environment variable holding the credential for authenticated HTTPS fetches.
pub const TOKEN_ENV: &str = "FURYCTL_TOKEN";

/// Primary HTTPS prefix of company repositories.
pub const HTTPS_REPO_PREFIX: &str = "https://github.com/sighupio/fury-kubernetes";

/// Fallback HTTPS prefix, used when the primary repository is not reachable.
pub const HTTPS_FALLBACK_REPO_PREFIX: &str = "https://github.com/sighupio/kubernetes-fury";

/// Primary SSH prefix of company repositories.
pub const SSH_REPO_PREFIX: &str = "git@github.com:sighupio/fury-kubernetes";

/// Fallback SSH prefix.
pub const SSH_FALLBACK_REPO_PREFIX: &str = "git@github.com:sighupio/kubernetes-fury";

/// Base URL of the forge API used to probe repository metadata.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Source of the distribution bundle, completed with `?ref=<version>`.
pub const DISTRIBUTION_SOURCE: &str = "github.com/sighupio/fury-distribution";

/// Directory packages are vendored into.
pub const VENDOR_DIR: &str = "vendor";

/// Returns the default cache root directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/furyctl` (XDG Base Directory)
/// - macOS: `~/Library/Caches/furyctl`
/// - Windows: `{FOLDERID_LocalAppData}\furyctl`
///
/// Falls back to `.furyctl-cache` in the current directory if the platform
/// cache directory cannot be determined.
///
/// This can be overridden by the `--cache-root` CLI flag or the
/// `FURYCTL_CACHE` environment variable.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".furyctl-cache"))
        .join("furyctl")
}

/// Number of concurrent package downloads when none is configured.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
