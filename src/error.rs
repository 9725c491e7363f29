//! # Error Handling
//!
//! This module defines the centralized error type for the `furyctl` core. It
//! uses `thiserror` to derive a single `Error` enum whose variants map one to
//! one onto the failure kinds of the acquisition and resolution pipeline.
//!
//! ## Key Components
//!
//! - **`Error`**: Every failure the library can report. Variants that callers
//!   branch on (for example `DownloadOptionsExhausted` or `SomeDownloadsFailed`)
//!   are stable and should be matched with `matches!` rather than by inspecting
//!   the rendered message.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! The variants fall into a few groups:
//!
//! - Fetch failures: exhausted protocol resolution, unsupported protocols,
//!   subprocess failures and timeouts, unreachable repositories.
//! - Cache failures: filesystem errors while populating or consuming an entry.
//! - Batch failures: the aggregate error of the package downloader.
//! - Merge and schema failures: scope navigation, schema loading and
//!   compilation, diagnostic pointer resolution.
//! - Wrapped errors from the standard library and third-party crates.
//!
//! Schema *validation* failures are not errors: they are reported as a list of
//! diagnostics (see `schema::ValidationDiagnostic`).

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for furyctl operations
#[derive(Error, Debug)]
pub enum Error {
    /// Every protocol in the allow-list was tried for an ambiguous source and
    /// none of them could fetch it.
    #[error("Download options exhausted for {src}: tried {}; last error: {last_error}", attempts.join(", "))]
    DownloadOptionsExhausted {
        src: String,
        /// The fully-prefixed sources that were attempted, in order.
        attempts: Vec<String>,
        /// Rendered failure of the final attempt.
        last_error: String,
    },

    /// A single fetch attempt failed.
    #[error("Download failed for {src}: {message}")]
    Download { src: String, message: String },

    /// The caching layer could not satisfy a download.
    ///
    /// Wraps the underlying failure; fetch failures are never cached.
    #[error("Cannot cache download of {src}: {source}")]
    CannotCacheDownload {
        src: String,
        #[source]
        source: Box<Error>,
    },

    /// A filesystem operation on the download cache failed.
    #[error("Cache operation error: {message}")]
    Cache { message: String },

    /// The source names a protocol this build cannot fetch.
    #[error("Unsupported protocol '{protocol}' for {src}")]
    UnsupportedProtocol { protocol: String, src: String },

    /// An external command (git, hg) exited unsuccessfully.
    #[error("Command failed for {src}: {command} - {stderr}")]
    Command {
        command: String,
        src: String,
        stderr: String,
    },

    /// An operation exceeded its deadline and was aborted.
    #[error("Operation timed out after {seconds}s: {operation}")]
    Timeout { operation: String, seconds: u64 },

    /// Neither the primary nor the fallback repository could be reached.
    #[error("Repository not reachable, tried {primary} and {fallback}: {message}")]
    RepositoryUnreachable {
        primary: String,
        fallback: String,
        message: String,
    },

    /// One or more package downloads failed. Each failure is logged
    /// individually before this error is returned.
    #[error("Some downloads failed: {failed} of {total} packages could not be vendored")]
    SomeDownloadsFailed { failed: usize, total: usize },

    /// The download worker pool could not be started.
    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// A package could not be resolved into a downloadable URL.
    #[error("Package resolution error for {package}: {message}")]
    PackageResolution { package: String, message: String },

    /// A manifest or configuration file could not be parsed.
    #[error("Configuration parsing error in {file}: {message}")]
    ConfigParse { file: String, message: String },

    /// The distribution does not ship a schema for the requested kind.
    #[error("Unsupported kind {kind} ({api_version}) for distribution {version}")]
    UnsupportedKind {
        kind: String,
        api_version: String,
        version: String,
    },

    /// A merge scope could not be navigated.
    #[error("Merge operation error: {scope} - {message}")]
    Merge { scope: String, message: String },

    /// The schema file could not be read.
    #[error("Schema file {} is unreadable: {source}", path.display())]
    SchemaUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The schema file is not valid JSON.
    #[error("Schema file {} is malformed JSON: {source}", path.display())]
    SchemaMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The schema is valid JSON but not a valid JSON Schema.
    #[error("Schema compilation failed for {}: {message}", path.display())]
    SchemaCompilation { path: PathBuf, message: String },

    /// A diagnostic pointer does not resolve against the validated document.
    #[error("Cannot resolve {pointer} in document: {message}")]
    PointerResolution { pointer: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An HTTP client error, wrapped from `reqwest::Error`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// An error indicating that a mutex has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
