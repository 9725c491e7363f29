//! Scoped deep merge of configuration documents.
//!
//! A [`MergeDocument`] pairs a document with a scope path such as
//! `.spec.distribution`. [`merge`] overlays the overlay's scope subtree onto
//! the base's scope subtree and returns the base document with that subtree
//! replaced:
//!
//! - mappings merge key by key, recursively
//! - sequences are replaced wholesale by the overlay's sequence
//! - on a type mismatch the overlay's value replaces the subtree
//!
//! [`apply_defaults`] runs the two ordered passes that fill a user
//! configuration from distribution defaults while keeping every value the
//! user set.

use std::fs;
use std::path::Path;

use log::{debug, warn};

use super::node::Node;
use super::{format_path, parse_path, PathSegment};
use crate::error::{Error, Result};

/// Scope of the defaults document.
pub const DEFAULTS_SCOPE: &str = ".data";
/// Scope of the user configuration document.
pub const CONFIG_SCOPE: &str = ".spec.distribution";

/// A document together with the subtree eligible for merging.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeDocument {
    root: Node,
    scope: Vec<PathSegment>,
}

impl MergeDocument {
    pub fn new(root: Node, scope: &str) -> Self {
        Self {
            root,
            scope: parse_path(scope),
        }
    }

    pub fn from_yaml_str(content: &str, scope: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        Ok(Self::new(Node::from(value), scope))
    }

    /// Reads a YAML document from disk.
    pub fn from_file(path: &Path, scope: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigParse {
            file: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml_str(&content, scope).map_err(|e| Error::ConfigParse {
            file: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    pub fn scope(&self) -> &[PathSegment] {
        &self.scope
    }

    /// The same tree, merged under a different scope.
    pub fn rescoped(self, scope: &str) -> Self {
        Self::new(self.root, scope)
    }

    /// The scope subtree, or `None` when the scope does not exist.
    ///
    /// Fails when the scope path crosses a scalar or sequence.
    pub fn scoped(&self) -> Result<Option<&Node>> {
        let mut current = &self.root;
        for (depth, segment) in self.scope.iter().enumerate() {
            match (current, segment) {
                (Node::Mapping(map), PathSegment::Key(key)) => match map.get(key) {
                    Some(next) => current = next,
                    None => return Ok(None),
                },
                (Node::Sequence(seq), PathSegment::Index(idx)) => match seq.get(*idx) {
                    Some(next) => current = next,
                    None => return Ok(None),
                },
                (node, _) if node.is_null() => return Ok(None),
                (node, _) => return Err(scope_error(&self.scope, depth, node)),
            }
        }
        Ok(Some(current))
    }
}

fn scope_error(scope: &[PathSegment], depth: usize, node: &Node) -> Error {
    Error::Merge {
        scope: format_path(scope),
        message: format!(
            "cannot descend into {} at '{}'",
            node.type_name(),
            format_path(&scope[..depth])
        ),
    }
}

/// Mutable navigation to the scope subtree, creating missing mappings.
fn scope_mut<'a>(root: &'a mut Node, scope: &[PathSegment]) -> Result<&'a mut Node> {
    let mut current = root;
    for (depth, segment) in scope.iter().enumerate() {
        if current.is_null() {
            *current = Node::empty_mapping();
        }
        let descends = match (&*current, segment) {
            (Node::Mapping(_), PathSegment::Key(_)) => true,
            (Node::Sequence(seq), PathSegment::Index(idx)) => *idx < seq.len(),
            _ => false,
        };
        if !descends {
            return Err(scope_error(scope, depth, current));
        }
        current = match (current, segment) {
            (Node::Mapping(map), PathSegment::Key(key)) => map.entry(key.clone()).or_default(),
            (Node::Sequence(seq), PathSegment::Index(idx)) => &mut seq[*idx],
            (node, _) => node,
        };
    }
    Ok(current)
}

/// Overlays `overlay`'s scope onto `base`'s scope.
///
/// The result is `base`'s full document, keeping `base`'s scope. A missing or
/// null overlay scope merges as an empty mapping; a missing base scope is
/// created.
pub fn merge(base: &MergeDocument, overlay: &MergeDocument) -> Result<MergeDocument> {
    let empty = Node::empty_mapping();
    let source = match overlay.scoped()? {
        Some(node) if !node.is_null() => node,
        _ => &empty,
    };

    let mut root = base.root.clone();
    let target = scope_mut(&mut root, &base.scope)?;
    if target.is_null() {
        *target = Node::empty_mapping();
    }
    merge_nodes(target, source, &format_path(&base.scope));

    Ok(MergeDocument {
        root,
        scope: base.scope.clone(),
    })
}

fn merge_nodes(target: &mut Node, source: &Node, path: &str) {
    if let (Node::Mapping(target_map), Node::Mapping(source_map)) = (&mut *target, source) {
        for (key, value) in source_map {
            let child_path = format!("{}.{}", path, key);
            match target_map.get_mut(key) {
                Some(existing) => merge_nodes(existing, value, &child_path),
                None => {
                    target_map.insert(key.clone(), value.clone());
                }
            }
        }
        return;
    }

    match (&*target, source) {
        (Node::Sequence(_), Node::Sequence(_)) => {
            debug!("Replacing sequence at '{}'", path);
        }
        (Node::Scalar(_), Node::Scalar(_)) => {}
        (existing, _) if !existing.is_null() => {
            warn!(
                "Type mismatch at '{}': replacing {} with {}",
                path,
                existing.type_name(),
                source.type_name()
            );
        }
        _ => {}
    }
    *target = source.clone();
}

/// Fills `config` from `defaults` in two ordered passes.
///
/// Pass one overlays the user's `.spec.distribution` onto the defaults'
/// `.data`. Pass two overlays that defaulted tree back onto the user's
/// document, so the returned document is the user's with a complete
/// `.spec.distribution` where every user-set value is kept.
pub fn apply_defaults(defaults: &MergeDocument, config: &MergeDocument) -> Result<MergeDocument> {
    let defaulted = merge(defaults, config)?;
    merge(config, &defaulted)
}
