//! # furyctl Library
//!
//! This library provides the distribution acquisition and configuration
//! resolution pipeline behind the `furyctl` command-line tool: fetching remote
//! artifacts over several protocols, caching them by content of their source
//! address, vendoring Furyfile packages from mirrored repositories, filling a
//! cluster configuration from distribution defaults and validating the result
//! against the distribution's JSON Schema.
//!
//! ## Quick Example
//!
//! ```
//! use furyctl::merge::{apply_defaults, MergeDocument, CONFIG_SCOPE, DEFAULTS_SCOPE};
//!
//! let defaults = MergeDocument::from_yaml_str(
//!     "data:\n  modules:\n    logging: {type: opensearch}\n    dr: {type: none}\n",
//!     DEFAULTS_SCOPE,
//! ).unwrap();
//! let config = MergeDocument::from_yaml_str(
//!     "kind: EKSCluster\nspec:\n  distribution:\n    modules:\n      logging: {type: loki}\n",
//!     CONFIG_SCOPE,
//! ).unwrap();
//!
//! let resolved = apply_defaults(&defaults, &config).unwrap();
//! let modules = resolved.scoped().unwrap().unwrap();
//! assert!(modules.as_mapping().unwrap().contains_key("modules"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Fetching (`fetch`)**: the [`fetch::Fetcher`] seam, the protocol-aware
//!   [`fetch::Getter`] and the [`fetch::ProtocolFallbackClient`] that tries
//!   each protocol prefix in turn.
//! - **Caching (`cache`)**: [`cache::CachingFetcher`] stores successful
//!   downloads under the SHA-256 of the normalized source address.
//! - **Vendoring (`vendor`)**: resolves Furyfile packages and downloads them
//!   concurrently, falling back to mirror repositories.
//! - **Merging (`merge`)**: the untyped document tree and the two-pass
//!   defaults merge.
//! - **Validation (`schema`)**: JSON Schema validation producing diagnostics
//!   anchored at JSON pointers into the defaulted document.
//! - **Distribution (`distribution`)**: ties the above together for one
//!   `furyctl.yaml`.

pub mod cache;
pub mod config;
pub mod defaults;
pub mod distribution;
pub mod error;
pub mod fetch;
pub mod filesystem;
pub mod git;
pub mod merge;
pub mod output;
pub mod schema;
pub mod settings;
pub mod source;
pub mod vendor;

#[cfg(test)]
mod properties;
