// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Typed configuration data model — the tree the Evaluator interprets.
//!
//! This crate owns the *shape* of configuration documents (`ConfigNode`),
//! the Evaluator's runtime value domain (`Value`), and the sentinel markers
//! used for in-band control flow. It has no opinion on how a document gets
//! from disk into a `ConfigNode` beyond [`node::parse_document`], which
//! assumes a YAML merge-key-flattened tree has already been produced by an
//! external reader.

pub mod error;
pub mod node;
pub mod ordered_map;
pub mod sentinel;
pub mod value;

pub use error::ParseError;
pub use node::{ConfigNode, Mapping, Scalar, parse_document};
pub use ordered_map::OrderedMap;
pub use sentinel::SentinelKind;
pub use value::{Callable, Value, ValueMap};
