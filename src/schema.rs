//! # Schema Validation
//!
//! Distribution schemas are JSON Schema documents, one per configuration
//! kind. This module compiles them and turns validation failures into
//! [`ValidationDiagnostic`]s: one per offending location, carrying the JSON
//! pointer, the concrete value found there and the validator's message.
//!
//! ## Key Components
//!
//! - **`SchemaDocument`**: a compiled schema. Loading distinguishes an
//!   unreadable file, malformed JSON and a schema that does not compile.
//! - **`Cause`**: the tree of validator errors. An `additionalProperties`
//!   failure is expanded into one child per unexpected key so the diagnostic
//!   points at the property itself rather than its parent object.
//! - **`ValidationDiagnostic`**: the user-facing result. Validation failures
//!   are data, not errors.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use jsonschema::error::ValidationErrorKind;
use jsonschema::paths::PathChunk;
use jsonschema::{JSONSchema, ValidationError};
use log::debug;

use crate::error::{Error, Result};
use crate::merge::{Node, PathSegment};

/// A location inside a document, rendered as `#/a/b/0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct InstancePointer(Vec<PathSegment>);

impl InstancePointer {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }
}

impl fmt::Display for InstancePointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("#")?;
        for segment in &self.0 {
            match segment {
                PathSegment::Key(key) => write!(f, "/{}", key.replace('~', "~0").replace('/', "~1"))?,
                PathSegment::Index(idx) => write!(f, "/{}", idx)?,
            }
        }
        Ok(())
    }
}

/// One validator failure and the failures nested beneath it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cause {
    pub pointer: InstancePointer,
    pub message: String,
    pub causes: Vec<Cause>,
}

impl Cause {
    /// Collects every cause without deeper causes, depth first.
    pub fn leaves(&self) -> Vec<&Cause> {
        if self.causes.is_empty() {
            return vec![self];
        }
        self.causes.iter().flat_map(Cause::leaves).collect()
    }
}

/// A single validation failure, addressed and annotated with its value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationDiagnostic {
    pub pointer: InstancePointer,
    pub value: Node,
    pub message: String,
}

fn pointer_from(path: &jsonschema::paths::JSONPointer) -> InstancePointer {
    InstancePointer(
        path.iter()
            .map(|chunk| match chunk {
                PathChunk::Property(name) => PathSegment::Key(name.to_string()),
                PathChunk::Index(idx) => PathSegment::Index(*idx),
                PathChunk::Keyword(keyword) => PathSegment::Key(keyword.to_string()),
            })
            .collect(),
    )
}

fn cause_from(error: &ValidationError<'_>) -> Cause {
    let pointer = pointer_from(&error.instance_path);
    let message = error.to_string();
    let causes = match &error.kind {
        ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
            .iter()
            .map(|name| Cause {
                pointer: pointer.child(PathSegment::Key(name.clone())),
                message: message.clone(),
                causes: Vec::new(),
            })
            .collect(),
        _ => Vec::new(),
    };
    Cause {
        pointer,
        message,
        causes,
    }
}

/// Lower-cased kind, apiVersion group without `.sighup.io`, and version.
///
/// ```
/// use furyctl::schema::schema_file_name;
///
/// assert_eq!(
///     schema_file_name("EKSCluster", "kfd.sighup.io/v1alpha2"),
///     "ekscluster-kfd-v1alpha2.json"
/// );
/// ```
pub fn schema_file_name(kind: &str, api_version: &str) -> String {
    let (group, version) = api_version.split_once('/').unwrap_or(("", api_version));
    let group = group.trim_end_matches(".sighup.io");
    let mut parts = vec![kind.to_lowercase()];
    parts.extend(
        [group, version]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string()),
    );
    format!("{}.json", parts.join("-"))
}

/// A compiled JSON Schema.
pub struct SchemaDocument {
    path: PathBuf,
    compiled: JSONSchema,
}

impl fmt::Debug for SchemaDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDocument")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SchemaDocument {
    /// Reads and compiles the schema at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::SchemaUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|source| Error::SchemaMalformed {
                path: path.to_path_buf(),
                source,
            })?;
        Self::compile(path, &value)
    }

    /// Compiles an in-memory schema; `path` is only used for messages.
    pub fn compile(path: &Path, schema: &serde_json::Value) -> Result<Self> {
        let compiled = JSONSchema::compile(schema).map_err(|e| Error::SchemaCompilation {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!("Compiled schema {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            compiled,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cause tree of validating `document`, or `None` when it is valid.
    pub fn causes(&self, document: &Node) -> Option<Cause> {
        let instance = document.to_json();
        let errors = match self.compiled.validate(&instance) {
            Ok(()) => return None,
            Err(errors) => errors,
        };
        let causes: Vec<Cause> = errors.map(|error| cause_from(&error)).collect();
        Some(Cause {
            pointer: InstancePointer::default(),
            message: format!("document does not conform to {}", self.path.display()),
            causes,
        })
    }

    /// Validates `document`, returning one diagnostic per failing location,
    /// sorted by pointer. An empty list means the document is valid.
    ///
    /// Fails with `PointerResolution` when a reported location cannot be
    /// found in `document`.
    pub fn validate(&self, document: &Node) -> Result<Vec<ValidationDiagnostic>> {
        let Some(root) = self.causes(document) else {
            return Ok(Vec::new());
        };

        let mut leaves: Vec<&Cause> = root.leaves();
        leaves.sort_by(|a, b| a.pointer.cmp(&b.pointer));

        let mut diagnostics: Vec<ValidationDiagnostic> = Vec::new();
        for leaf in leaves {
            if let Some(last) = diagnostics.last_mut() {
                if last.pointer == leaf.pointer {
                    if !last.message.contains(&leaf.message) {
                        last.message = format!("{}; {}", last.message, leaf.message);
                    }
                    continue;
                }
            }
            let value = resolve(document, &leaf.pointer)?;
            diagnostics.push(ValidationDiagnostic {
                pointer: leaf.pointer.clone(),
                value,
                message: leaf.message.clone(),
            });
        }
        Ok(diagnostics)
    }
}

/// Recovers the value at `pointer` in `document`.
pub fn resolve(document: &Node, pointer: &InstancePointer) -> Result<Node> {
    let mut current = document;
    for segment in pointer.segments() {
        current = current.child(segment).ok_or_else(|| Error::PointerResolution {
            pointer: pointer.to_string(),
            message: format!(
                "expected a {} at {:?} but found {}",
                match segment {
                    PathSegment::Key(_) => "mapping",
                    PathSegment::Index(_) => "sequence",
                },
                segment,
                current.type_name()
            ),
        })?;
    }
    Ok(current.clone())
}
