// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Concrete leaf transformers and the `case`/`ignore` predicate arms.

use adapt_dsl::{ConfigNode, SentinelKind, Value};

use super::{Transformer, compile_transformer};
use crate::error::{Result, SerializeError};
use crate::predicate::Predicate;
use crate::value_literal::literal_value;

/// Fallback formats tried, in order, after RFC 3339/2822 both fail. The pack
/// carries no `dateutil`-equivalent free-form date parser, so this widens
/// (rather than replicates) the original's fully flexible `dateutil.parser.
/// parse` with the common forms it's actually fed in practice: space- and
/// `T`-separated timestamps with optional fractional seconds, date-only
/// ISO/slash/dash variants, the compact `YYYYMMDD` form, and month-name
/// forms. See DESIGN.md for the honest account of what this narrows.
const DATE_PARSER_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%Y%m%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Mirrors Python's `str(value)` — notably `str(None) == "None"` and
/// `str(True)/str(False) == "True"/"False"`, not the empty string or
/// lowercase `true`/`false` a naive Rust `Display` would produce.
fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => format!("{other:?}"),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

pub struct DateTransformer {
    pub input: String,
    pub output: String,
}
impl Transformer for DateTransformer {
    fn apply(&self, value: &Value) -> Result<Value> {
        let text = value.as_str().ok_or_else(|| SerializeError::InvalidFormatTag(format!("date input must be a string, got {value:?}")))?;
        let parsed = chrono::NaiveDate::parse_from_str(text, &self.input)
            .or_else(|_| chrono::NaiveDateTime::parse_from_str(text, &self.input).map(|dt| dt.date()))
            .map_err(|e| SerializeError::InvalidFormatTag(format!("cannot parse '{text}' with format '{}': {e}", self.input)))?;
        Ok(Value::string(parsed.format(&self.output).to_string()))
    }
}

pub struct DateParserTransformer {
    pub output: String,
}
impl Transformer for DateParserTransformer {
    fn apply(&self, value: &Value) -> Result<Value> {
        let text = value.as_str().ok_or_else(|| SerializeError::InvalidFormatTag(format!("date_parser input must be a string, got {value:?}")))?;
        let trimmed = text.trim();

        // RFC 3339 (ISO 8601 with a timezone offset, e.g. `2021-01-02T03:04:05+05:30`)
        // and RFC 2822 cover the two structured forms `dateutil.parser.parse`
        // is most often fed and a plain strptime format list can't express
        // (variable-width fractional seconds, a trailing offset).
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Value::string(dt.naive_utc().date().format(&self.output).to_string()));
        }
        if let Ok(dt) = chrono::DateTime::parse_from_rfc2822(trimmed) {
            return Ok(Value::string(dt.naive_utc().date().format(&self.output).to_string()));
        }
        for fmt in DATE_PARSER_FORMATS {
            if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, fmt) {
                return Ok(Value::string(dt.date().format(&self.output).to_string()));
            }
            if let Ok(d) = chrono::NaiveDate::parse_from_str(trimmed, fmt) {
                return Ok(Value::string(d.format(&self.output).to_string()));
            }
        }
        Err(SerializeError::InvalidFormatTag(format!("could not parse '{text}' as a date with any known format")))
    }
}

pub struct FloatTransformer {
    pub precision: i32,
}
impl Transformer for FloatTransformer {
    fn apply(&self, value: &Value) -> Result<Value> {
        let raw = as_f64(value).ok_or_else(|| SerializeError::InvalidFormatTag(format!("cannot coerce {value:?} to a float")))?;
        let factor = 10f64.powi(self.precision);
        Ok(Value::Float((raw * factor).round() / factor))
    }
}

pub struct IntegerTransformer;
impl Transformer for IntegerTransformer {
    fn apply(&self, value: &Value) -> Result<Value> {
        let n = match value {
            Value::Int(i) => *i,
            Value::Float(f) => *f as i64,
            Value::Bool(b) => i64::from(*b),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| SerializeError::InvalidFormatTag(format!("cannot coerce '{s}' to an integer")))?,
            other => return Err(SerializeError::InvalidFormatTag(format!("cannot coerce {other:?} to an integer"))),
        };
        Ok(Value::Int(n))
    }
}

pub struct BoolTransformer;
impl Transformer for BoolTransformer {
    fn apply(&self, value: &Value) -> Result<Value> {
        let b = match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Map(m) => !m.is_empty(),
            _ => true,
        };
        Ok(Value::Bool(b))
    }
}

pub struct StringTransformer;
impl Transformer for StringTransformer {
    fn apply(&self, value: &Value) -> Result<Value> {
        Ok(Value::string(display_text(value)))
    }
}

pub struct EnumTransformer {
    pub mappings: Vec<(String, Value)>,
    pub on_error: Option<Value>,
}
impl Transformer for EnumTransformer {
    fn apply(&self, value: &Value) -> Result<Value> {
        let key = display_text(value);
        match self.mappings.iter().find(|(k, _)| *k == key) {
            Some((_, v)) => Ok(v.clone()),
            None => self
                .on_error
                .clone()
                .ok_or_else(|| SerializeError::EnumMiss(key.clone())),
        }
    }
}

pub struct CurrencyTransformer {
    pub multiplier: f64,
    pub rounding: i32,
}
impl Transformer for CurrencyTransformer {
    fn apply(&self, value: &Value) -> Result<Value> {
        let raw = as_f64(value).ok_or_else(|| SerializeError::InvalidFormatTag(format!("cannot coerce {value:?} to a currency amount")))?;
        let factor = 10f64.powi(self.rounding);
        Ok(Value::Float((raw * self.multiplier * factor).round() / factor))
    }
}

pub struct ConstantTransformer {
    pub value: Value,
}
impl Transformer for ConstantTransformer {
    fn apply(&self, _value: &Value) -> Result<Value> {
        Ok(self.value.clone())
    }
}

/// One arm's `then`: a literal value, or a compiled sub-transformer fed a
/// field resolved from the record (`then.field`, or the matched `when.field`
/// if `then` doesn't override it).
pub enum ThenBranch {
    Literal(Value),
    Sub { field_override: Option<String>, transformer: Box<dyn Transformer> },
}

pub fn compile_then(node: &ConfigNode) -> Result<ThenBranch> {
    if node.is_typed() {
        let field_override = node.as_mapping().and_then(|m| m.get("field")).and_then(ConfigNode::as_str).map(str::to_string);
        Ok(ThenBranch::Sub { field_override, transformer: compile_transformer(node)? })
    } else {
        Ok(ThenBranch::Literal(literal_value(node)))
    }
}

fn resolve_then(record_map: &adapt_dsl::ValueMap, matched_field: &str, then: &ThenBranch) -> Result<Value> {
    match then {
        ThenBranch::Literal(v) => Ok(v.clone()),
        ThenBranch::Sub { field_override, transformer } => {
            let source_field = field_override.as_deref().unwrap_or(matched_field);
            let input = record_map.get(source_field).cloned().unwrap_or(Value::Null);
            transformer.apply(&input)
        }
    }
}

pub struct CaseTransformer {
    pub arms: Vec<(Predicate, ThenBranch)>,
    pub default: Option<Value>,
}
impl Transformer for CaseTransformer {
    fn apply(&self, record: &Value) -> Result<Value> {
        let record_map = record
            .as_map()
            .ok_or_else(|| SerializeError::InvalidSchema { where_: "case".into(), reason: "expected the current record".into() })?;
        for (predicate, then) in &self.arms {
            let Some(field_value) = record_map.get(&predicate.field) else {
                continue; // CASE_MISS — the field is absent, skip this arm
            };
            if predicate.evaluate(field_value) {
                return resolve_then(record_map, &predicate.field, then);
            }
        }
        Ok(self.default.clone().unwrap_or(Value::Null))
    }
}

pub fn compile_case(args: &adapt_dsl::Mapping) -> Result<Box<dyn Transformer>> {
    let cases = args
        .get("cases")
        .and_then(ConfigNode::as_sequence)
        .ok_or_else(|| SerializeError::InvalidSchema { where_: "case".into(), reason: "missing `cases`".into() })?;

    let mut arms = Vec::with_capacity(cases.len());
    for entry in cases {
        let entry_map = entry
            .as_mapping()
            .ok_or_else(|| SerializeError::InvalidSchema { where_: "case.cases".into(), reason: "entry must be a mapping".into() })?;
        let when_node = entry_map
            .get("when")
            .ok_or_else(|| SerializeError::InvalidSchema { where_: "case.cases".into(), reason: "entry missing `when`".into() })?;
        let predicate = Predicate::compile(when_node, None)?;
        let then_node = entry_map
            .get("then")
            .ok_or_else(|| SerializeError::InvalidSchema { where_: "case.cases".into(), reason: "entry missing `then`".into() })?;
        arms.push((predicate, compile_then(then_node)?));
    }
    let default = args.get("default").map(literal_value);
    Ok(Box::new(CaseTransformer { arms, default }))
}

/// The `ignore` pre-gate: shape identical to one `case` arm, applied before
/// a field's own transformer.
pub struct IgnoreTransformer {
    pub predicate: Predicate,
    pub then: ThenBranch,
}
impl Transformer for IgnoreTransformer {
    fn apply(&self, record: &Value) -> Result<Value> {
        let record_map = record
            .as_map()
            .ok_or_else(|| SerializeError::InvalidSchema { where_: "ignore".into(), reason: "expected the current record".into() })?;
        match record_map.get(&self.predicate.field) {
            // Predicate field absent: distinct from "present but predicate
            // false". `case` skips the arm (CASE_MISS) for this; `ignore`
            // fires with a null value instead, writing the field as null
            // rather than falling through to its transformer.
            None => Ok(Value::Null),
            Some(field_value) if self.predicate.evaluate(field_value) => resolve_then(record_map, &self.predicate.field, &self.then),
            Some(_) => Ok(Value::Sentinel(SentinelKind::DoNotIgnore)),
        }
    }
}
