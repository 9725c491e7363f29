//! Shared test utilities for E2E tests.
//!
//! This module provides common fixtures, helper functions, and configuration
//! snippets to reduce duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_config(configs::EKS_CLUSTER)
//!         .with_distribution(distributions::DEFAULTS_VALID);
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::distributions;
    pub use super::TestFixture;
}

/// Common configuration YAML snippets for testing.
#[allow(dead_code)]
pub mod configs {
    /// Minimal EKSCluster configuration with an empty distribution section.
    pub const EKS_CLUSTER: &str = r#"apiVersion: kfd.sighup.io/v1alpha2
kind: EKSCluster
metadata:
  name: e2e
spec:
  distributionVersion: v1.24.7
  distribution: {}
"#;

    /// Configuration of a kind the test distribution does not support.
    pub const UNSUPPORTED_KIND: &str = r#"apiVersion: kfd.sighup.io/v1alpha2
kind: OnPremises
spec:
  distributionVersion: v1.24.7
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "invalid: yaml: content:";
}

/// Distribution bundle contents.
#[allow(dead_code)]
pub mod distributions {
    pub const MANIFEST: &str = r#"version: v1.24.7
furyctlSchemas:
  eks:
    - apiVersion: kfd.sighup.io/v1alpha2
      kind: EKSCluster
"#;

    pub const SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "spec": {
      "type": "object",
      "properties": {
        "distribution": {
          "type": "object",
          "properties": {
            "modules": {
              "type": "object",
              "properties": {
                "ingress": {
                  "type": "object",
                  "additionalProperties": false,
                  "properties": {"test": {"type": "string"}}
                }
              }
            }
          }
        }
      }
    }
  }
}"#;

    /// Defaults that satisfy [`SCHEMA`].
    pub const DEFAULTS_VALID: &str = "data:\n  modules:\n    ingress:\n      test: test\n";

    /// Defaults carrying a property [`SCHEMA`] rejects.
    pub const DEFAULTS_UNEXPECTED: &str =
        "data:\n  modules:\n    ingress:\n      test: test\n      unexpected: test\n";
}

/// A test fixture that provides a temporary directory with optional
/// configuration and distribution bundle.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_config(configs::EKS_CLUSTER)
///     .with_distribution(distributions::DEFAULTS_VALID);
///
/// fixture
///     .validate_command()
///     .assert()
///     .success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `furyctl.yaml` configuration file with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.with_file("furyctl.yaml", content)
    }

    /// Add a distribution bundle under `distribution/` with the given defaults.
    #[allow(dead_code)]
    pub fn with_distribution(self, defaults: &str) -> Self {
        self.with_file("distribution/kfd.yaml", distributions::MANIFEST)
            .with_file("distribution/furyctl-defaults.yaml", defaults)
            .with_file(
                "distribution/schemas/public/ekscluster-kfd-v1alpha2.json",
                distributions::SCHEMA,
            )
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the distribution bundle.
    #[allow(dead_code)]
    pub fn distribution_path(&self) -> PathBuf {
        self.temp_dir.path().join("distribution")
    }

    /// Get the path to the cache used by commands of this fixture.
    #[allow(dead_code)]
    pub fn cache_path(&self) -> PathBuf {
        self.temp_dir.path().join("cache")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// Create a command running in this fixture's directory, with its own
    /// cache and plain output.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("furyctl");
        cmd.current_dir(self.path())
            .env("FURYCTL_CACHE", self.cache_path())
            .env_remove("CLICOLOR_FORCE")
            .env_remove("RUST_LOG")
            .arg("--color")
            .arg("never");
        cmd
    }

    /// Create a `validate config` command pointing at the local distribution.
    #[allow(dead_code)]
    pub fn validate_command(&self) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.arg("validate")
            .arg("config")
            .arg("--distro-location")
            .arg(self.distribution_path());
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_distribution() {
        let fixture = TestFixture::new().with_distribution(distributions::DEFAULTS_VALID);
        assert!(fixture.distribution_path().join("kfd.yaml").exists());
        assert!(fixture
            .distribution_path()
            .join("schemas/public/ekscluster-kfd-v1alpha2.json")
            .exists());
    }

    #[test]
    fn test_configs_are_valid_yaml() {
        for config in [configs::EKS_CLUSTER, configs::UNSUPPORTED_KIND, distributions::MANIFEST] {
            serde_yaml::from_str::<serde_yaml::Value>(config).expect("Config should be valid YAML");
        }
        serde_json::from_str::<serde_json::Value>(distributions::SCHEMA).expect("Schema should be valid JSON");
    }

    #[test]
    fn test_invalid_yaml_is_actually_invalid() {
        let result = serde_yaml::from_str::<serde_yaml::Value>(configs::INVALID_YAML);
        assert!(result.is_err(), "INVALID_YAML should not parse");
    }
}
