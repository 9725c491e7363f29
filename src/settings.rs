//! Runtime settings for the fetch and vendoring layers.
//!
//! Everything that would otherwise be a process-wide flag (the protocol list,
//! HTTPS vs SSH, parallelism, credentials) is carried by an explicit struct
//! handed to the constructors that need it.

use std::time::Duration;

use crate::defaults;

/// Settings for single-source fetches (protocol fallback, getter).
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Protocol prefixes tried, in order, for ambiguous sources.
    pub protocols: Vec<String>,
    /// Deadline applied to every network request and subprocess.
    pub timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            protocols: defaults::PROTOCOLS.iter().map(|p| p.to_string()).collect(),
            timeout: defaults::OPERATION_TIMEOUT,
        }
    }
}

/// Primary and fallback location of company repositories for one transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPrefixes {
    pub primary: String,
    pub fallback: String,
}

/// Settings for the mirrored package downloader.
#[derive(Debug, Clone)]
pub struct DownloaderSettings {
    /// Use HTTPS (with reachability probes) instead of SSH.
    pub https: bool,
    /// Maximum number of packages downloaded concurrently.
    pub parallelism: usize,
    /// Deadline applied to every probe and transfer.
    pub timeout: Duration,
    /// Credential embedded in HTTPS URLs and sent as bearer token to probes.
    pub token: Option<String>,
    pub https_prefixes: RepoPrefixes,
    pub ssh_prefixes: RepoPrefixes,
    /// Base URL of the forge API, e.g. `https://api.github.com`.
    pub api_base: String,
}

impl DownloaderSettings {
    /// Reads the credential from `FURYCTL_TOKEN`, ignoring empty values.
    pub fn token_from_env() -> Option<String> {
        std::env::var(defaults::TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }

    /// The prefixes for the configured transport.
    pub fn prefixes(&self) -> &RepoPrefixes {
        if self.https {
            &self.https_prefixes
        } else {
            &self.ssh_prefixes
        }
    }

    pub fn with_https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    /// Sets the parallelism, clamped to at least one worker.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }
}

impl Default for DownloaderSettings {
    fn default() -> Self {
        Self {
            https: false,
            parallelism: defaults::default_parallelism(),
            timeout: defaults::OPERATION_TIMEOUT,
            token: Self::token_from_env(),
            https_prefixes: RepoPrefixes {
                primary: defaults::HTTPS_REPO_PREFIX.to_string(),
                fallback: defaults::HTTPS_FALLBACK_REPO_PREFIX.to_string(),
            },
            ssh_prefixes: RepoPrefixes {
                primary: defaults::SSH_REPO_PREFIX.to_string(),
                fallback: defaults::SSH_FALLBACK_REPO_PREFIX.to_string(),
            },
            api_base: defaults::GITHUB_API_BASE.to_string(),
        }
    }
}
