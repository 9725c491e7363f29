//! # Distribution Resolution
//!
//! A distribution bundle is the versioned set of files a configuration is
//! resolved against:
//!
//! ```text
//! kfd.yaml                                   manifest
//! furyctl-defaults.yaml                      defaults, merged from `.data`
//! schemas/public/<kind>-<group>-<version>.json
//! ```
//!
//! [`DistributionResolver`] fetches the bundle, fills the user configuration
//! from the defaults and validates the result against the schema for the
//! configuration's kind.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::ConfigHeader;
use crate::defaults::DISTRIBUTION_SOURCE;
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::merge::{apply_defaults, MergeDocument, CONFIG_SCOPE, DEFAULTS_SCOPE};
use crate::schema::{schema_file_name, SchemaDocument, ValidationDiagnostic};

pub const MANIFEST_FILE: &str = "kfd.yaml";
pub const DEFAULTS_FILE: &str = "furyctl-defaults.yaml";
pub const SCHEMAS_DIR: &str = "schemas/public";

/// A `(apiVersion, kind)` pair the distribution ships a schema for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRef {
    pub api_version: String,
    pub kind: String,
}

/// `kfd.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KfdManifest {
    pub version: String,
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
    #[serde(default)]
    pub kubernetes: BTreeMap<String, serde_yaml::Value>,
    /// Supported configuration kinds, grouped by provider.
    #[serde(default)]
    pub furyctl_schemas: BTreeMap<String, Vec<SchemaRef>>,
    #[serde(default)]
    pub tools: BTreeMap<String, serde_yaml::Value>,
}

impl KfdManifest {
    /// Whether the manifest declares `kind`. A manifest without any
    /// `furyctlSchemas` accepts every kind.
    pub fn supports(&self, kind: &str, api_version: &str) -> bool {
        if self.furyctl_schemas.is_empty() {
            return true;
        }
        self.furyctl_schemas
            .values()
            .flatten()
            .any(|s| s.kind == kind && s.api_version == api_version)
    }
}

/// The source of distribution `version` in the public repository.
pub fn distribution_source(version: &str) -> String {
    format!("{}?ref={}", DISTRIBUTION_SOURCE, version)
}

/// A fetched distribution on disk.
#[derive(Debug, Clone)]
pub struct DistributionBundle {
    root: PathBuf,
}

impl DistributionBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn schema_path(&self, kind: &str, api_version: &str) -> PathBuf {
        self.root
            .join(SCHEMAS_DIR)
            .join(schema_file_name(kind, api_version))
    }

    pub fn load_manifest(&self) -> Result<KfdManifest> {
        let path = self.root.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path).map_err(|e| Error::ConfigParse {
            file: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_yaml::from_str(&content).map_err(|e| Error::ConfigParse {
            file: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn load_defaults(&self) -> Result<MergeDocument> {
        MergeDocument::from_file(&self.root.join(DEFAULTS_FILE), DEFAULTS_SCOPE)
    }

    pub fn load_schema(&self, kind: &str, api_version: &str) -> Result<SchemaDocument> {
        SchemaDocument::load(&self.schema_path(kind, api_version))
    }
}

/// Outcome of resolving a configuration.
#[derive(Debug)]
pub struct Resolution {
    pub manifest: KfdManifest,
    /// The user configuration with every default filled in.
    pub config: MergeDocument,
    /// Empty when `config` is valid.
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl Resolution {
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Defaults and validates `config` against an already fetched bundle.
pub fn resolve_with_bundle(bundle: &DistributionBundle, config: &MergeDocument, header: &ConfigHeader) -> Result<Resolution> {
    let manifest = bundle.load_manifest()?;
    if !manifest.supports(&header.kind, &header.api_version) {
        return Err(Error::UnsupportedKind {
            kind: header.kind.clone(),
            api_version: header.api_version.clone(),
            version: manifest.version.clone(),
        });
    }

    let schema = bundle.load_schema(&header.kind, &header.api_version)?;
    let defaults = bundle.load_defaults()?;

    let resolved = apply_defaults(&defaults, config)?;
    let diagnostics = schema.validate(resolved.root())?;
    debug!(
        "Validated {} against {}: {} diagnostics",
        header.kind,
        schema.path().display(),
        diagnostics.len()
    );

    Ok(Resolution {
        manifest,
        config: resolved,
        diagnostics,
    })
}

/// Fetches distributions and resolves configurations against them.
pub struct DistributionResolver<F> {
    fetcher: F,
}

impl<F: Fetcher> DistributionResolver<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Fetches the bundle at `src` into `dst`.
    pub fn fetch(&self, src: &str, dst: &Path) -> Result<DistributionBundle> {
        info!("Downloading distribution from {}", src);
        self.fetcher.download(src, dst)?;
        Ok(DistributionBundle::new(dst))
    }

    /// Resolves the configuration at `config_path`.
    ///
    /// The bundle comes from `location` when given, otherwise from the public
    /// repository at the configuration's `distributionVersion`. It is fetched
    /// into `workdir/distribution`.
    pub fn resolve(&self, config_path: &Path, location: Option<&str>, workdir: &Path) -> Result<Resolution> {
        let header = ConfigHeader::from_file(config_path)?;
        let config = MergeDocument::from_file(config_path, CONFIG_SCOPE)?;

        let src = match location {
            Some(location) => location.to_string(),
            None => distribution_source(&header.spec.distribution_version),
        };
        let bundle = self.fetch(&src, &workdir.join("distribution"))?;

        resolve_with_bundle(&bundle, &config, &header)
    }
}
