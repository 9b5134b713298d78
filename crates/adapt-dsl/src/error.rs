// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Parse-time errors for the configuration data model.

/// Errors raised while lifting a generic document tree into a [`crate::node::ConfigNode`]
/// or while a handler demands a shape the node does not have.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A typed node was expected (a mapping carrying a `type` entry) but the
    /// node had none.
    #[error("expected a typed node (mapping with a `type` entry), got: {0}")]
    MissingTypeTag(String),

    /// The node's shape didn't match what was expected (e.g. a number too
    /// large to represent, or a YAML construct with no JSON equivalent).
    #[error("invalid configuration node shape: {0}")]
    InvalidShape(String),

    /// The YAML document itself failed to parse.
    #[error("invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Re-encoding a YAML value as JSON failed.
    #[error("invalid JSON conversion: {0}")]
    Json(#[source] serde_json::Error),
}
