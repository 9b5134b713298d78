// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Value post-processing shared by `constant` and `external_input`: split a
//! string on a delimiter, then render the resulting sequence with one of a
//! closed set of tags. Order is fixed — split, then render, nothing more
//! (spec §9 design note on `split_on`/`format_as` combining).

use std::str::FromStr;

use adapt_dsl::Value;
use strum::EnumString;

use crate::error::EvalError;

/// The closed set of renderers `format_as` may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum FormatTag {
    #[strum(serialize = "INT")]
    Int,
    #[strum(serialize = "STRING_UNQUOTED")]
    StringUnquoted,
    #[strum(serialize = "STRING_SINGLE_QUOTED")]
    StringSingleQuoted,
    #[strum(serialize = "STRING_DOUBLE_QUOTED")]
    StringDoubleQuoted,
    #[strum(serialize = "INT_LIST")]
    IntList,
    #[strum(serialize = "SINGLE_QUOTED_LIST")]
    SingleQuotedList,
    #[strum(serialize = "DOUBLE_QUOTED_LIST")]
    DoubleQuotedList,
}

impl FormatTag {
    pub fn parse(tag: &str) -> Result<Self, EvalError> {
        FormatTag::from_str(tag).map_err(|_| EvalError::InvalidFormatTag(tag.to_string()))
    }
}

/// Plain text form of a value for use inside a rendered literal — strings
/// pass through unquoted, everything else uses its natural display form.
pub(crate) fn item_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => format!("{other:?}"),
    }
}

fn render(items: &[Value], tag: FormatTag) -> Result<Value, EvalError> {
    match tag {
        FormatTag::Int => {
            let text = items
                .first()
                .map(item_text)
                .ok_or_else(|| EvalError::InvalidFormatTag("INT renderer needs a value".into()))?;
            let n: i64 = text
                .trim()
                .parse()
                .map_err(|_| EvalError::InvalidFormatTag(format!("cannot parse '{text}' as INT")))?;
            Ok(Value::Int(n))
        }
        FormatTag::StringUnquoted => Ok(Value::String(items.first().map(item_text).unwrap_or_default())),
        FormatTag::StringSingleQuoted => {
            Ok(Value::String(format!("'{}'", items.first().map(item_text).unwrap_or_default())))
        }
        FormatTag::StringDoubleQuoted => {
            Ok(Value::String(format!("\"{}\"", items.first().map(item_text).unwrap_or_default())))
        }
        FormatTag::IntList => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                let text = item_text(item);
                let n: i64 = text
                    .trim()
                    .parse()
                    .map_err(|_| EvalError::InvalidFormatTag(format!("cannot parse '{text}' as INT_LIST element")))?;
                parts.push(n.to_string());
            }
            Ok(Value::String(format!("({})", parts.join(", "))))
        }
        FormatTag::SingleQuotedList => {
            let parts: Vec<String> = items.iter().map(|v| format!("'{}'", item_text(v))).collect();
            Ok(Value::String(format!("({})", parts.join(", "))))
        }
        FormatTag::DoubleQuotedList => {
            let parts: Vec<String> = items.iter().map(|v| format!("\"{}\"", item_text(v))).collect();
            Ok(Value::String(format!("({})", parts.join(", "))))
        }
    }
}

/// Apply the split-then-render pipeline. With neither `split_on` nor
/// `format_as` set, the input passes through unchanged.
pub fn format_value(
    value: &Value,
    split_on: Option<&str>,
    format_as: Option<FormatTag>,
) -> Result<Value, EvalError> {
    match (split_on, format_as) {
        (None, None) => Ok(value.clone()),
        (Some(delim), format_as) => {
            let text = value
                .as_str()
                .ok_or_else(|| EvalError::InvalidFormatTag(format!("split_on requires a string value, got {value:?}")))?;
            let items: Vec<Value> = text.split(delim).map(Value::string).collect();
            match format_as {
                Some(tag) => render(&items, tag),
                None => Ok(Value::List(items)),
            }
        }
        (None, Some(tag)) => render(std::slice::from_ref(value), tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_delimiter_no_tag_passes_through() {
        let v = Value::string("abc");
        assert_eq!(format_value(&v, None, None).unwrap(), v);
    }

    #[test]
    fn int_list_renders_parenthesized_numbers() {
        let v = Value::string("123,456");
        let out = format_value(&v, Some(","), Some(FormatTag::IntList)).unwrap();
        assert_eq!(out, Value::string("(123, 456)"));
    }

    #[test]
    fn double_quoted_list_single_element() {
        let v = Value::string("ENABLED");
        let out = format_value(&v, Some(","), Some(FormatTag::DoubleQuotedList)).unwrap();
        assert_eq!(out, Value::string("(\"ENABLED\")"));
    }

    #[test]
    fn string_double_quoted_no_split() {
        let v = Value::string("hello");
        let out = format_value(&v, None, Some(FormatTag::StringDoubleQuoted)).unwrap();
        assert_eq!(out, Value::string("\"hello\""));
    }

    #[test]
    fn unknown_tag_is_fatal() {
        assert!(FormatTag::parse("NOT_A_TAG").is_err());
    }

    #[test]
    fn single_quoted_list_multiple_elements() {
        let v = Value::string("a,b,c");
        let out = format_value(&v, Some(","), Some(FormatTag::SingleQuotedList)).unwrap();
        assert_eq!(out, Value::string("('a', 'b', 'c')"));
    }
}
