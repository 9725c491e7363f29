//! End-to-end resolution scenarios using datatest-stable for test data discovery
//!
//! Each directory under `tests/testdata/scenarios` holds a `furyctl.yaml`, a
//! `distribution/` bundle next to it and an `expected.yaml` describing the
//! diagnostics (and optionally some defaulted values) the resolution must
//! produce. The bundle is read straight from disk, no fetching involved.

use furyctl::config::ConfigHeader;
use furyctl::distribution::{resolve_with_bundle, DistributionBundle};
use furyctl::merge::{parse_path, MergeDocument, CONFIG_SCOPE};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Expected {
    #[serde(default)]
    values: Vec<ExpectedValue>,
    #[serde(default)]
    diagnostics: Vec<ExpectedDiagnostic>,
}

#[derive(Debug, Deserialize)]
struct ExpectedValue {
    path: String,
    value: serde_yaml::Value,
}

#[derive(Debug, Deserialize)]
struct ExpectedDiagnostic {
    pointer: String,
    value: Option<serde_yaml::Value>,
    message_contains: Option<String>,
}

/// Resolves one scenario and compares it with its `expected.yaml`
fn test_scenario(path: &Path) -> datatest_stable::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| format!("{} has no parent directory", path.display()))?;

    let expected_content = std::fs::read_to_string(dir.join("expected.yaml"))
        .map_err(|e| format!("Failed to read expected.yaml in {}: {}", dir.display(), e))?;
    let expected: Expected = serde_yaml::from_str(&expected_content)?;

    let header = ConfigHeader::from_file(path)?;
    let config = MergeDocument::from_file(path, CONFIG_SCOPE)?;
    let bundle = DistributionBundle::new(dir.join("distribution"));

    let resolution = resolve_with_bundle(&bundle, &config, &header)
        .map_err(|e| format!("Failed to resolve {}: {}", path.display(), e))?;

    for expected_value in &expected.values {
        let actual = resolution
            .config
            .root()
            .at(&parse_path(&expected_value.path))
            .map(|node| node.to_json());
        assert_eq!(
            actual,
            Some(serde_json::to_value(&expected_value.value)?),
            "Unexpected value at {} in {}",
            expected_value.path,
            path.display()
        );
    }

    let pointers: Vec<String> = resolution
        .diagnostics
        .iter()
        .map(|d| d.pointer.to_string())
        .collect();
    let expected_pointers: Vec<&str> = expected
        .diagnostics
        .iter()
        .map(|d| d.pointer.as_str())
        .collect();
    assert_eq!(pointers, expected_pointers, "Diagnostics differ in {}", path.display());

    for (diagnostic, wanted) in resolution.diagnostics.iter().zip(&expected.diagnostics) {
        if let Some(value) = &wanted.value {
            assert_eq!(
                diagnostic.value.to_json(),
                serde_json::to_value(value)?,
                "Unexpected value for {} in {}",
                wanted.pointer,
                path.display()
            );
        }
        if let Some(fragment) = &wanted.message_contains {
            assert!(
                diagnostic.message.contains(fragment.as_str()),
                "Message '{}' for {} should contain '{}'",
                diagnostic.message,
                wanted.pointer,
                fragment
            );
        }
    }

    assert_eq!(resolution.is_valid(), expected.diagnostics.is_empty());
    Ok(())
}

// Register datatest harness to discover and run every scenario configuration
datatest_stable::harness!(test_scenario, "tests/testdata/scenarios", r"furyctl\.yaml$");
