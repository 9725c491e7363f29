//! Untyped document tree used by the merge engine and the schema validator.
//!
//! Documents are parsed from YAML and converted into [`Node`], a closed
//! variant of scalar, sequence and mapping. Mapping keys are strings; YAML
//! keys of other types are rendered to their YAML text. Tags are dropped.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_yaml::Value as YamlValue;

use super::PathSegment;

/// A scalar leaf.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// A node of an untyped document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Scalar(Scalar),
    Sequence(Vec<Node>),
    Mapping(BTreeMap<String, Node>),
}

impl Default for Node {
    fn default() -> Self {
        Node::Scalar(Scalar::Null)
    }
}

impl Node {
    pub fn empty_mapping() -> Self {
        Node::Mapping(BTreeMap::new())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Node::Scalar(Scalar::String(value.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Scalar(Scalar::Null))
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Short name of the node kind, for messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Scalar(Scalar::Null) => "null",
            Node::Scalar(Scalar::Bool(_)) => "boolean",
            Node::Scalar(Scalar::Integer(_)) => "integer",
            Node::Scalar(Scalar::Float(_)) => "float",
            Node::Scalar(Scalar::String(_)) => "string",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
        }
    }

    /// Follows one path segment.
    pub fn child(&self, segment: &PathSegment) -> Option<&Node> {
        match (self, segment) {
            (Node::Mapping(map), PathSegment::Key(key)) => map.get(key),
            (Node::Sequence(seq), PathSegment::Index(idx)) => seq.get(*idx),
            _ => None,
        }
    }

    /// Follows a full path from this node.
    pub fn at(&self, path: &[PathSegment]) -> Option<&Node> {
        path.iter().try_fold(self, |node, segment| node.child(segment))
    }

    /// Converts to a JSON value for schema validation. Non-finite floats
    /// become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Node::Scalar(Scalar::Null) => Value::Null,
            Node::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            Node::Scalar(Scalar::Integer(i)) => Value::from(*i),
            Node::Scalar(Scalar::Float(f)) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Node::Scalar(Scalar::String(s)) => Value::String(s.clone()),
            Node::Sequence(seq) => Value::Array(seq.iter().map(Node::to_json).collect()),
            Node::Mapping(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn key_to_string(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl From<YamlValue> for Node {
    fn from(value: YamlValue) -> Self {
        match value {
            YamlValue::Null => Node::Scalar(Scalar::Null),
            YamlValue::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            YamlValue::Number(n) => match n.as_i64() {
                Some(i) => Node::Scalar(Scalar::Integer(i)),
                None => Node::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            YamlValue::String(s) => Node::Scalar(Scalar::String(s)),
            YamlValue::Sequence(seq) => Node::Sequence(seq.into_iter().map(Node::from).collect()),
            YamlValue::Mapping(map) => Node::Mapping(
                map.into_iter()
                    .map(|(k, v)| (key_to_string(k), Node::from(v)))
                    .collect(),
            ),
            YamlValue::Tagged(tagged) => Node::from(tagged.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Node {
        Node::from(serde_yaml::from_str::<YamlValue>(yaml).unwrap())
    }

    #[test]
    fn test_from_yaml_scalars() {
        let node = parse("a: 1\nb: 1.5\nc: true\nd: ~\ne: text\n");
        let map = node.as_mapping().unwrap();
        assert_eq!(map["a"], Node::Scalar(Scalar::Integer(1)));
        assert_eq!(map["b"], Node::Scalar(Scalar::Float(1.5)));
        assert_eq!(map["c"], Node::Scalar(Scalar::Bool(true)));
        assert!(map["d"].is_null());
        assert_eq!(map["e"].as_str(), Some("text"));
    }

    #[test]
    fn test_non_string_keys_are_stringified() {
        let node = parse("1: one\ntrue: yes\n");
        let map = node.as_mapping().unwrap();
        assert!(map.contains_key("1"));
        assert!(map.contains_key("true"));
    }

    #[test]
    fn test_tags_are_unwrapped() {
        let node = parse("value: !secret hunter2\n");
        assert_eq!(
            node.at(&[PathSegment::Key("value".to_string())])
                .and_then(Node::as_str),
            Some("hunter2")
        );
    }

    #[test]
    fn test_at_follows_keys_and_indices() {
        let node = parse("spec:\n  nodes:\n    - name: infra\n");
        let path = [
            PathSegment::Key("spec".to_string()),
            PathSegment::Key("nodes".to_string()),
            PathSegment::Index(0),
            PathSegment::Key("name".to_string()),
        ];
        assert_eq!(node.at(&path).and_then(Node::as_str), Some("infra"));
        assert!(node.at(&[PathSegment::Index(0)]).is_none());
    }

    #[test]
    fn test_to_json() {
        let node = parse("a: [1, two]\nb: {c: null}\n");
        assert_eq!(
            node.to_json(),
            serde_json::json!({"a": [1, "two"], "b": {"c": null}})
        );
    }

    #[test]
    fn test_serializes_back_to_yaml() {
        let node = parse("kind: EKSCluster\nspec:\n  distributionVersion: v1.24.7\n");
        let yaml = serde_yaml::to_string(&node).unwrap();
        assert!(yaml.contains("kind: EKSCluster"));
        assert!(yaml.contains("distributionVersion: v1.24.7"));
    }
}
