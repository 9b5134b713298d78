// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! `when` clause compilation — `{field, <op>: operand}` — shared by `case`
//! arms and the `ignore` pre-gate.

use std::cmp::Ordering;

use adapt_dsl::{ConfigNode, Value};

use crate::error::{Result, SerializeError};
use crate::value_literal::literal_value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

const OPERATOR_KEYS: &[(&str, Operator)] = &[
    ("equal", Operator::Equal),
    ("not_equal", Operator::NotEqual),
    ("greater_than", Operator::GreaterThan),
    ("less_than", Operator::LessThan),
    ("in", Operator::In),
    ("not_in", Operator::NotIn),
    ("null", Operator::IsNull),
    ("not_null", Operator::IsNotNull),
];

#[derive(Debug, Clone)]
pub struct Predicate {
    pub field: String,
    pub operator: Operator,
    pub operand: Value,
}

impl Predicate {
    /// Compile a `when` mapping. `default_field` is used when the clause
    /// omits `field` (the `ignore` pre-gate defaults it to `entry.from`).
    pub fn compile(node: &ConfigNode, default_field: Option<&str>) -> Result<Self> {
        let mapping = node
            .as_mapping()
            .ok_or_else(|| SerializeError::InvalidSchema { where_: "when".into(), reason: "must be a mapping".into() })?;

        let field = match mapping.get("field").and_then(ConfigNode::as_str) {
            Some(f) => f.to_string(),
            None => default_field
                .ok_or_else(|| SerializeError::InvalidSchema { where_: "when".into(), reason: "missing `field`".into() })?
                .to_string(),
        };

        let mut found: Vec<(Operator, &ConfigNode)> = Vec::new();
        for (key, op) in OPERATOR_KEYS {
            if let Some(operand_node) = mapping.get(key) {
                found.push((*op, operand_node));
            }
        }
        // `null`/`not_null` take no operand value but are still spelled as a
        // mapping key; their presence (any value, conventionally `true`)
        // still counts toward the ambiguity check above.

        if found.len() != 1 {
            return Err(SerializeError::PredicateOperatorAmbiguous(format!(
                "expected exactly one operator key, found {}",
                found.len()
            )));
        }
        let (operator, operand_node) = found.remove(0);
        let operand = literal_value(operand_node);

        Ok(Predicate { field, operator, operand })
    }

    pub fn evaluate(&self, value: &Value) -> bool {
        match self.operator {
            Operator::Equal => *value == self.operand,
            Operator::NotEqual => *value != self.operand,
            Operator::GreaterThan => !value.is_null() && compare(value, &self.operand) == Some(Ordering::Greater),
            Operator::LessThan => !value.is_null() && compare(value, &self.operand) == Some(Ordering::Less),
            Operator::In => self.operand.as_list().is_some_and(|items| items.contains(value)),
            Operator::NotIn => !self.operand.as_list().is_some_and(|items| items.contains(value)),
            Operator::IsNull => value.is_null(),
            Operator::IsNotNull => !value.is_null(),
        }
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return x.partial_cmp(&y);
    }
    if let (Value::String(x), Value::String(y)) = (a, b) {
        return Some(x.cmp(y));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt_dsl::parse_document;

    #[test]
    fn compiles_equal_predicate() {
        let node = parse_document("field: status\nequal: ENABLED\n").unwrap();
        let pred = Predicate::compile(&node, None).unwrap();
        assert_eq!(pred.field, "status");
        assert!(pred.evaluate(&Value::string("ENABLED")));
        assert!(!pred.evaluate(&Value::string("PAUSED")));
    }

    #[test]
    fn defaults_field_when_omitted() {
        let node = parse_document("equal: 1\n").unwrap();
        let pred = Predicate::compile(&node, Some("count")).unwrap();
        assert_eq!(pred.field, "count");
    }

    #[test]
    fn zero_operators_is_ambiguous() {
        let node = parse_document("field: x\n").unwrap();
        let err = Predicate::compile(&node, None).unwrap_err();
        assert!(matches!(err, SerializeError::PredicateOperatorAmbiguous(_)));
    }

    #[test]
    fn multiple_operators_is_ambiguous() {
        let node = parse_document("field: x\nequal: 1\nnot_equal: 2\n").unwrap();
        let err = Predicate::compile(&node, None).unwrap_err();
        assert!(matches!(err, SerializeError::PredicateOperatorAmbiguous(_)));
    }

    #[test]
    fn greater_than_is_false_for_null() {
        let node = parse_document("field: x\ngreater_than: 5\n").unwrap();
        let pred = Predicate::compile(&node, None).unwrap();
        assert!(!pred.evaluate(&Value::Null));
        assert!(pred.evaluate(&Value::Int(10)));
        assert!(!pred.evaluate(&Value::Int(1)));
    }

    #[test]
    fn in_checks_list_membership() {
        let node = parse_document("field: x\nin: [1, 2, 3]\n").unwrap();
        let pred = Predicate::compile(&node, None).unwrap();
        assert!(pred.evaluate(&Value::Int(2)));
        assert!(!pred.evaluate(&Value::Int(9)));
    }
}
