//! # Fetching Remote Artifacts
//!
//! Everything that turns a source string into files on disk implements the
//! [`Fetcher`] trait. Implementations compose explicitly:
//!
//! - [`Getter`] performs exactly one attempt with one protocol.
//! - [`ProtocolFallbackClient`] wraps a fetcher and tries every allowed
//!   protocol prefix for ambiguous sources.
//! - [`crate::cache::CachingFetcher`] wraps any fetcher with the on-disk
//!   content-addressed cache.
//!
//! A typical production stack is
//! `CachingFetcher<ProtocolFallbackClient<Getter>>`. Tests substitute any layer
//! with a mock implementation of the trait.

pub mod getter;
pub mod protocol;

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

pub use getter::Getter;
pub use protocol::ProtocolFallbackClient;

/// Fetches a source into a destination directory.
pub trait Fetcher: Send + Sync {
    /// Fetch `src` so that its content is available at `dst`.
    fn download(&self, src: &str, dst: &Path) -> Result<()>;
}

impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    fn download(&self, src: &str, dst: &Path) -> Result<()> {
        (**self).download(src, dst)
    }
}

impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    fn download(&self, src: &str, dst: &Path) -> Result<()> {
        (**self).download(src, dst)
    }
}
