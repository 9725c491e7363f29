//! Protocol fallback for ambiguous sources.
//!
//! A source that carries an allow-listed forcing prefix is fetched with that
//! protocol only. Any other source is retried with every allowed prefix in
//! order until one succeeds. Each attempt writes into its own staging
//! directory beside `dst`; only a successful attempt is moved onto `dst`, so a
//! failed protocol never leaves files behind for the next one to trip over.

use std::path::Path;

use log::{debug, info};

use super::Fetcher;
use crate::error::{Error, Result};
use crate::filesystem;
use crate::source::Source;

/// Tries a fixed, ordered list of protocol prefixes around an inner fetcher.
pub struct ProtocolFallbackClient<F> {
    inner: F,
    protocols: Vec<String>,
}

impl<F: Fetcher> ProtocolFallbackClient<F> {
    pub fn new(inner: F, protocols: Vec<String>) -> Self {
        Self { inner, protocols }
    }

    pub fn protocols(&self) -> &[String] {
        &self.protocols
    }

    /// The sources to try for `src`, in order.
    pub fn candidates(&self, src: &str) -> Vec<Source> {
        let source = Source::new(src);
        if source.known_prefix(&self.protocols).is_some() {
            return vec![source];
        }
        self.protocols.iter().map(|p| source.with_prefix(p)).collect()
    }

    fn attempt(&self, candidate: &Source, dst: &Path) -> Result<()> {
        let staging = filesystem::staging_dir_for(dst, ".furyctl-attempt-")?;
        let target = staging.path().join("payload");
        self.inner.download(candidate.as_str(), &target)?;
        filesystem::replace_dir(&target, dst)
    }
}

impl<F: Fetcher> Fetcher for ProtocolFallbackClient<F> {
    fn download(&self, src: &str, dst: &Path) -> Result<()> {
        let mut attempts = Vec::new();
        let mut last_error = String::from("no protocols configured");

        for candidate in self.candidates(src) {
            attempts.push(candidate.to_string());
            match self.attempt(&candidate, dst) {
                Ok(()) => {
                    info!("Downloaded {} into {}", candidate, dst.display());
                    return Ok(());
                }
                Err(e) => {
                    debug!("Attempt {} failed: {}", candidate, e);
                    last_error = e.to_string();
                }
            }
        }

        Err(Error::DownloadOptionsExhausted {
            src: src.to_string(),
            attempts,
            last_error,
        })
    }
}
