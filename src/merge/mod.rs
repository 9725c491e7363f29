//! Merge operations for configuration documents
//!
//! Configuration resolution overlays a user document onto the defaults shipped
//! with a distribution. Documents are untyped trees ([`node::Node`]) and a
//! merge is restricted to a scope: the subtree addressed by a path expression
//! such as `.spec.distribution`.
//!
//! ## Key Components
//!
//! - **`node`**: the document tree and its conversion from YAML.
//! - **`defaults`**: `MergeDocument`, the scoped deep merge and the two-pass
//!   defaulting of a user configuration.
//!
//! The `PathSegment` enum is shared with the schema validator, which uses it
//! to address the offending values of diagnostics.

pub mod defaults;
pub mod node;

pub use defaults::{apply_defaults, merge, MergeDocument, CONFIG_SCOPE, DEFAULTS_SCOPE};
pub use node::{Node, Scalar};

/// Represents a segment in a path expression for navigating nested structures
///
/// Path expressions like "spec.nodes[0].name" or ".spec.distribution"
/// are parsed into a sequence of PathSegments for navigation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// A named key for accessing mapping members
    Key(String),
    /// A numeric index for accessing sequence elements
    Index(usize),
}

/// Splits a scope path such as `.spec.distribution` or `spec.nodes[0].name`
/// into segments.
///
/// A leading dot is optional and `.` alone is the document root. Keys that
/// contain dots are written quoted in brackets (`metadata["a.b"]`) or with an
/// escaped dot (`a\.b`). A bare bracket holding a number is a sequence index.
///
/// ```
/// use furyctl::merge::{parse_path, PathSegment};
///
/// let segments = parse_path(".spec.distribution");
/// assert_eq!(segments, vec![
///     PathSegment::Key("spec".to_string()),
///     PathSegment::Key("distribution".to_string()),
/// ]);
/// ```
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut key = String::new();
    let mut chars = path.trim().trim_start_matches('/').chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => key.extend(chars.next()),
            '.' => flush_key(&mut key, &mut segments),
            '[' => {
                flush_key(&mut key, &mut segments);
                segments.extend(bracket_segment(&mut chars));
            }
            _ => key.push(ch),
        }
    }
    flush_key(&mut key, &mut segments);

    segments
}

fn flush_key(key: &mut String, segments: &mut Vec<PathSegment>) {
    if !key.is_empty() {
        segments.push(PathSegment::Key(std::mem::take(key)));
    }
}

/// Reads the remainder of a `[...]` group, the opening bracket consumed.
fn bracket_segment(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<PathSegment> {
    let quote = chars.next_if(|c| *c == '"' || *c == '\'');
    let mut content = String::new();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(_), '\\') => content.extend(chars.next()),
            (Some(q), c) if c == q && chars.peek() == Some(&']') => {
                chars.next();
                return Some(PathSegment::Key(content));
            }
            (None, ']') => break,
            (_, c) => content.push(c),
        }
    }

    if quote.is_some() {
        return Some(PathSegment::Key(content));
    }
    let content = content.trim();
    match content.parse::<usize>() {
        Ok(idx) => Some(PathSegment::Index(idx)),
        Err(_) if content.is_empty() => None,
        Err(_) => Some(PathSegment::Key(content.to_string())),
    }
}

/// Render segments back into a dotted path (`.spec.nodes[0].name`).
pub fn format_path(segments: &[PathSegment]) -> String {
    if segments.is_empty() {
        return ".".to_string();
    }
    segments
        .iter()
        .map(|segment| match segment {
            PathSegment::Key(key) if key.contains('.') => format!("[\"{}\"]", key),
            PathSegment::Key(key) => format!(".{}", key),
            PathSegment::Index(idx) => format!("[{}]", idx),
        })
        .collect()
}
