//! # Configuration Files
//!
//! This module defines the serde models of the two declarative files the
//! pipeline reads:
//!
//! - **`Furyfile`** (`Furyfile.yml`): the dependency manifest consumed by the
//!   package downloader. It lists roles, modules and bases (katalog packages),
//!   default versions per block, registry provider URL templates, and external
//!   packages fetched from an arbitrary source.
//!
//! - **`ConfigHeader`** (`furyctl.yaml`): the typed header of a user
//!   configuration (`apiVersion`, `kind`, `spec.distributionVersion`). The rest
//!   of the document is deliberately untyped; it is handled as a
//!   [`crate::merge::Node`] tree.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A package entry under `roles`, `modules` or `bases`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSpec {
    /// `<block>/<remainder>`, e.g. `monitoring/prometheus-operator`.
    pub name: String,
    /// Overrides the block version from `versions`.
    #[serde(default)]
    pub version: Option<String>,
    /// Fetch from a provider registry instead of the company repositories.
    #[serde(default)]
    pub registry: bool,
    #[serde(default)]
    pub provider: Option<ProviderSpec>,
}

/// Selects a registry provider entry by name and label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub name: String,
    pub label: String,
}

/// A registry URL template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOption {
    #[serde(alias = "url")]
    pub uri: String,
    pub label: String,
}

/// A package fetched verbatim from `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalSpec {
    pub name: String,
    pub url: String,
    /// Destination relative to the vendor directory.
    #[serde(default)]
    pub dir: Option<String>,
}

/// The dependency manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Furyfile {
    /// Default version per block.
    #[serde(default)]
    pub versions: BTreeMap<String, String>,
    #[serde(default)]
    pub roles: Vec<PackageSpec>,
    #[serde(default)]
    pub modules: Vec<PackageSpec>,
    /// Katalog packages.
    #[serde(default)]
    pub bases: Vec<PackageSpec>,
    #[serde(default)]
    pub external: Vec<ExternalSpec>,
    /// `provider.<kind>.<name>` lists the registry URL templates.
    #[serde(default)]
    pub provider: BTreeMap<String, BTreeMap<String, Vec<ProviderOption>>>,
}

impl Furyfile {
    pub fn parse(content: &str) -> Result<Self> {
        let furyfile: Furyfile = serde_yaml::from_str(content)?;
        Ok(furyfile)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigParse {
            file: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content).map_err(|e| Error::ConfigParse {
            file: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// `spec` fields the pipeline reads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSpec {
    pub distribution_version: String,
}

/// The typed header of a `furyctl.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigHeader {
    pub api_version: String,
    pub kind: String,
    pub spec: ConfigSpec,
}

impl ConfigHeader {
    pub fn parse(content: &str) -> Result<Self> {
        let header: ConfigHeader = serde_yaml::from_str(content)?;
        Ok(header)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigParse {
            file: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content).map_err(|e| Error::ConfigParse {
            file: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
