// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Field transformers — the Serializer's own leaf dispatch table, distinct
//! from the Evaluator's `type` handlers in `adapt_core` (names may overlap;
//! semantics differ). Each is compiled once from its config subtree into a
//! `(value) -> value` function object.

mod builtins;

use adapt_dsl::{ConfigNode, Value};

pub use builtins::{CaseTransformer, IgnoreTransformer, ThenBranch};

use crate::error::{Result, SerializeError};
use crate::predicate::Predicate;
use crate::value_literal::literal_value;

/// A compiled field transformer. `case`/`ignore` are passed the whole
/// current record (or accumulator) as `value`; every other transformer is
/// passed the single resolved field value — the runtime decides which, per
/// the transformer's declared type.
pub trait Transformer: Send + Sync {
    fn apply(&self, value: &Value) -> Result<Value>;
}

/// Does this compiled transformer expect the whole record/accumulator as its
/// `value`, rather than a single resolved field?
pub fn wants_whole_record(node: &ConfigNode) -> bool {
    node.type_tag() == Some("case")
}

pub fn compile_transformer(node: &ConfigNode) -> Result<Box<dyn Transformer>> {
    let tag = node
        .type_tag()
        .ok_or_else(|| SerializeError::InvalidSchema { where_: "transform".into(), reason: "missing `type`".into() })?;
    let args = node.args();

    Ok(match tag {
        "date" => Box::new(builtins::DateTransformer {
            input: require_str(&args, "input", "date")?,
            output: require_str(&args, "output", "date")?,
        }),
        "date_parser" => Box::new(builtins::DateParserTransformer { output: require_str(&args, "output", "date_parser")? }),
        "float" => Box::new(builtins::FloatTransformer { precision: require_i32(&args, "precision", "float")? }),
        "integer" => Box::new(builtins::IntegerTransformer),
        "bool" => Box::new(builtins::BoolTransformer),
        "string" => Box::new(builtins::StringTransformer),
        "enum" => {
            let mappings_node = args
                .get("mappings")
                .and_then(ConfigNode::as_mapping)
                .ok_or_else(|| SerializeError::InvalidSchema { where_: "enum.mappings".into(), reason: "must be a mapping".into() })?;
            let mappings = mappings_node.iter().map(|(k, v)| (k.to_string(), literal_value(v))).collect();
            let on_error = args.get("on_error").map(literal_value);
            Box::new(builtins::EnumTransformer { mappings, on_error })
        }
        "currency" => Box::new(builtins::CurrencyTransformer {
            multiplier: require_f64(&args, "multiplier", "currency")?,
            rounding: optional_i32(&args, "rounding").unwrap_or(2),
        }),
        "constant" => {
            let value_node = args
                .get("value")
                .ok_or_else(|| SerializeError::InvalidSchema { where_: "constant".into(), reason: "missing `value`".into() })?;
            Box::new(builtins::ConstantTransformer { value: literal_value(value_node) })
        }
        "case" => builtins::compile_case(&args)?,
        other => return Err(SerializeError::UnknownType(other.to_string())),
    })
}

/// Compile the `ignore` pre-gate attached to an `inline`/`derived` field.
/// `default_field` is `entry.from` — used when `when` omits `field`.
pub fn compile_ignore(node: &ConfigNode, default_field: &str) -> Result<IgnoreTransformer> {
    let mapping = node
        .as_mapping()
        .ok_or_else(|| SerializeError::InvalidSchema { where_: "ignore".into(), reason: "must be a mapping".into() })?;
    let when_node = mapping
        .get("when")
        .ok_or_else(|| SerializeError::InvalidSchema { where_: "ignore".into(), reason: "missing `when`".into() })?;
    let predicate = Predicate::compile(when_node, Some(default_field))?;
    let then_node = mapping
        .get("then")
        .ok_or_else(|| SerializeError::InvalidSchema { where_: "ignore".into(), reason: "missing `then`".into() })?;
    let then = builtins::compile_then(then_node)?;
    Ok(IgnoreTransformer { predicate, then })
}

fn require_str(args: &adapt_dsl::Mapping, key: &str, transformer: &'static str) -> Result<String> {
    args.get(key)
        .and_then(ConfigNode::as_str)
        .map(str::to_string)
        .ok_or_else(|| SerializeError::InvalidSchema { where_: transformer.into(), reason: format!("missing `{key}`") })
}

fn require_i32(args: &adapt_dsl::Mapping, key: &str, transformer: &'static str) -> Result<i32> {
    match args.get(key).and_then(ConfigNode::as_scalar) {
        Some(adapt_dsl::Scalar::Int(i)) => Ok(*i as i32),
        _ => Err(SerializeError::InvalidSchema { where_: transformer.into(), reason: format!("missing or non-integer `{key}`") }),
    }
}

fn optional_i32(args: &adapt_dsl::Mapping, key: &str) -> Option<i32> {
    match args.get(key).and_then(ConfigNode::as_scalar) {
        Some(adapt_dsl::Scalar::Int(i)) => Some(*i as i32),
        _ => None,
    }
}

fn require_f64(args: &adapt_dsl::Mapping, key: &str, transformer: &'static str) -> Result<f64> {
    match args.get(key).and_then(ConfigNode::as_scalar) {
        Some(adapt_dsl::Scalar::Int(i)) => Ok(*i as f64),
        Some(adapt_dsl::Scalar::Float(f)) => Ok(*f),
        _ => Err(SerializeError::InvalidSchema { where_: transformer.into(), reason: format!("missing or non-numeric `{key}`") }),
    }
}
