// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Pure conversion of a literal [`ConfigNode`] (a `when` operand, a `case`
//! arm's `then`, a `constant` transformer's `value`) into a [`Value`]. No
//! typed dispatch — the serializer schema has no Evaluator of its own, so a
//! node here is always already-literal data.

use adapt_dsl::{ConfigNode, Scalar, Value};

pub fn literal_value(node: &ConfigNode) -> Value {
    match node {
        ConfigNode::Scalar(Scalar::Null) => Value::Null,
        ConfigNode::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
        ConfigNode::Scalar(Scalar::Int(i)) => Value::Int(*i),
        ConfigNode::Scalar(Scalar::Float(f)) => Value::Float(*f),
        ConfigNode::Scalar(Scalar::String(s)) => Value::String(s.clone()),
        ConfigNode::Sequence(items) => Value::List(items.iter().map(literal_value).collect()),
        ConfigNode::Mapping(m) => Value::Map(m.iter().map(|(k, v)| (k.to_string(), literal_value(v))).collect()),
    }
}
