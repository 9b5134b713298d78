// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! `ConfigNode` — the recursive, tagged tree a YAML/JSON document reader
//! hands to the Evaluator.

use crate::error::ParseError;
use crate::ordered_map::OrderedMap;

/// A primitive leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

/// An insertion-ordered keyed record. A mapping carrying a `type` entry is a
/// typed node; any other mapping is opaque data.
pub type Mapping = OrderedMap<ConfigNode>;

/// A recursive, tagged configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    Scalar(Scalar),
    Sequence(Vec<ConfigNode>),
    Mapping(Mapping),
}

impl ConfigNode {
    pub fn null() -> Self {
        ConfigNode::Scalar(Scalar::Null)
    }

    pub fn string(s: impl Into<String>) -> Self {
        ConfigNode::Scalar(Scalar::String(s.into()))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            ConfigNode::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[ConfigNode]> {
        match self {
            ConfigNode::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            ConfigNode::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    /// The node's `type` tag, if it is a typed mapping.
    pub fn type_tag(&self) -> Option<&str> {
        self.as_mapping()?.get("type")?.as_str()
    }

    pub fn is_typed(&self) -> bool {
        self.type_tag().is_some()
    }

    /// The mapping's entries excluding `type` — the handler's named
    /// arguments. Returns an empty mapping for non-mapping nodes.
    pub fn args(&self) -> Mapping {
        match self.as_mapping() {
            Some(m) => m
                .iter()
                .filter(|(k, _)| *k != "type")
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            None => Mapping::new(),
        }
    }

    /// Require this node to be a typed mapping, returning `(tag, args)`.
    pub fn require_typed(&self) -> Result<(&str, Mapping), ParseError> {
        let tag = self
            .type_tag()
            .ok_or_else(|| ParseError::MissingTypeTag(format!("{:?}", self)))?;
        Ok((tag, self.args()))
    }
}

impl TryFrom<serde_json::Value> for ConfigNode {
    type Error = ParseError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value as J;
        Ok(match value {
            J::Null => ConfigNode::Scalar(Scalar::Null),
            J::Bool(b) => ConfigNode::Scalar(Scalar::Bool(b)),
            J::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ConfigNode::Scalar(Scalar::Int(i))
                } else if let Some(f) = n.as_f64() {
                    ConfigNode::Scalar(Scalar::Float(f))
                } else {
                    return Err(ParseError::InvalidShape(format!("unrepresentable number {n}")));
                }
            }
            J::String(s) => ConfigNode::Scalar(Scalar::String(s)),
            J::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(ConfigNode::try_from(item)?);
                }
                ConfigNode::Sequence(out)
            }
            J::Object(entries) => {
                let mut mapping = Mapping::with_capacity(entries.len());
                for (k, v) in entries {
                    mapping.insert(k, ConfigNode::try_from(v)?);
                }
                ConfigNode::Mapping(mapping)
            }
        })
    }
}

/// Parse a document already decoded from YAML (or JSON) text into the
/// generic tree, then lift it into a [`ConfigNode`]. Reading the file itself
/// is the YAML reader's job, external to this crate.
pub fn parse_document(text: &str) -> Result<ConfigNode, ParseError> {
    let yaml_value: serde_yaml::Value = serde_yaml::from_str(text)?;
    let json_value = serde_json::to_value(yaml_value).map_err(ParseError::Json)?;
    ConfigNode::try_from(json_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_mapping_round_trip() {
        let json = serde_json::json!({
            "type": "constant",
            "value": "v1"
        });
        let node = ConfigNode::try_from(json).unwrap();
        let (tag, args) = node.require_typed().unwrap();
        assert_eq!(tag, "constant");
        assert_eq!(args.get("value").unwrap().as_str(), Some("v1"));
        assert!(args.get("type").is_none());
    }

    #[test]
    fn plain_mapping_has_no_type_tag() {
        let json = serde_json::json!({"a": 1, "b": 2});
        let node = ConfigNode::try_from(json).unwrap();
        assert!(!node.is_typed());
    }

    #[test]
    fn mapping_preserves_key_order() {
        let json = serde_json::json!({"z": 1, "a": 2, "m": 3});
        let node = ConfigNode::try_from(json).unwrap();
        let mapping = node.as_mapping().unwrap();
        assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn parse_document_from_yaml_text() {
        let text = "type: constant\nvalue: hello\n";
        let node = parse_document(text).unwrap();
        let (tag, args) = node.require_typed().unwrap();
        assert_eq!(tag, "constant");
        assert_eq!(args.get("value").unwrap().as_str(), Some("hello"));
    }

    #[test]
    fn sequence_of_scalars() {
        let json = serde_json::json!([1, "two", false, null]);
        let node = ConfigNode::try_from(json).unwrap();
        let seq = node.as_sequence().unwrap();
        assert_eq!(seq.len(), 4);
        assert_eq!(seq[0], ConfigNode::Scalar(Scalar::Int(1)));
        assert_eq!(seq[3], ConfigNode::Scalar(Scalar::Null));
    }
}
