// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Compiles a `{inline, derived, constants}` schema mapping into a
//! [`SerializerSchema`] the runtime walks per record.

use std::collections::HashSet;

use adapt_dsl::{ConfigNode, Value};

use crate::error::{Result, SerializeError};
use crate::transformer::{IgnoreTransformer, Transformer, compile_ignore, compile_transformer, wants_whole_record};
use crate::value_literal::literal_value;

/// What an `inline`/`derived` field entry produces.
pub enum FieldBody {
    Transform(Box<dyn Transformer>),
    Array(SerializerSchema),
    ExtendedArray(SerializerSchema),
}

pub struct Field {
    pub name: String,
    /// Flat (non-dotted) key into the field's resolved scope — the raw
    /// source record for inline fields (or `object`'s resolved value, if
    /// `object` is set), a plain accumulator key for derived fields. `None`
    /// means "the whole record/accumulator" — derived fields may omit `from`
    /// to mean that, and `case`/`ignore` always receive it regardless.
    pub from: Option<String>,
    /// Inline-only dotted nested-object selector (`a.b.c`), walked one
    /// segment at a time against the source record before `from` is looked
    /// up. A missing segment short-circuits the field to `null` without
    /// running its transformer at all — see `_get_inner_object` in the
    /// original.
    pub object: Option<String>,
    pub ignore: Option<IgnoreTransformer>,
    /// `true` for a `case` transform — the runtime feeds it the whole
    /// current record (the source record for `inline` fields, the
    /// accumulator for `derived` fields) rather than the single value
    /// resolved from `from`.
    pub is_whole_record: bool,
    pub body: FieldBody,
}

/// A compiled serializer schema: the three field categories plus the master
/// key set used for `dict_normalize`.
pub struct SerializerSchema {
    pub inline: Vec<Field>,
    pub derived: Vec<Field>,
    pub constants: Vec<Field>,
    pub dict_normalize: bool,
    pub key_set: Vec<String>,
}

impl SerializerSchema {
    /// Compile a schema mapping. `dict_normalize` comes from the parent
    /// context: the root schema's own `dict_normalize` flag, `false` for
    /// `array` sub-schemas, and the parent's value (inherited) for
    /// `extended_array` sub-schemas.
    pub fn compile(node: &ConfigNode, dict_normalize: bool) -> Result<Self> {
        let mapping = node
            .as_mapping()
            .ok_or_else(|| SerializeError::InvalidSchema { where_: "schema".into(), reason: "must be a mapping".into() })?;

        let mut declared_names: HashSet<String> = HashSet::new();
        let mut key_set: Vec<String> = Vec::new();

        let inline = compile_inline_section(mapping.get("inline"), "inline", &mut declared_names, &mut key_set, dict_normalize)?;
        let derived = compile_flat_section(mapping.get("derived"), "derived", &mut declared_names, &mut key_set, false)?;
        let constants = compile_flat_section(mapping.get("constants"), "constants", &mut declared_names, &mut key_set, true)?;

        Ok(SerializerSchema { inline, derived, constants, dict_normalize, key_set })
    }
}

fn require_entry_str(entry: &adapt_dsl::Mapping, key: &str, category: &str) -> Result<String> {
    entry
        .get(key)
        .and_then(ConfigNode::as_str)
        .map(str::to_string)
        .ok_or_else(|| SerializeError::InvalidSchema { where_: category.into(), reason: format!("entry missing `{key}`") })
}

fn register_name(declared: &mut HashSet<String>, category: &str, name: &str) -> Result<()> {
    if !declared.insert(name.to_string()) {
        return Err(SerializeError::DuplicateField(format!("{category}.{name}")));
    }
    Ok(())
}

/// `derived`/`constants`: no `array`/`extended_array` sub-schemas, every
/// entry compiles to a plain transformer.
fn compile_flat_section(
    node: Option<&ConfigNode>,
    category: &str,
    declared: &mut HashSet<String>,
    key_set: &mut Vec<String>,
    is_constants: bool,
) -> Result<Vec<Field>> {
    let Some(node) = node else { return Ok(Vec::new()) };
    let entries = node
        .as_sequence()
        .ok_or_else(|| SerializeError::InvalidSchema { where_: category.into(), reason: "must be a sequence".into() })?;

    let mut fields = Vec::with_capacity(entries.len());
    for entry in entries {
        let entry_map = entry
            .as_mapping()
            .ok_or_else(|| SerializeError::InvalidSchema { where_: category.into(), reason: "entry must be a mapping".into() })?;
        let name = require_entry_str(entry_map, "name", category)?;
        register_name(declared, category, &name)?;
        key_set.push(name.clone());

        if is_constants {
            let value_node = entry_map
                .get("value")
                .ok_or_else(|| SerializeError::InvalidSchema { where_: category.into(), reason: format!("entry `{name}` missing `value`") })?;
            let value = literal_value(value_node);
            fields.push(Field {
                name,
                from: None,
                object: None,
                ignore: None,
                is_whole_record: false,
                body: FieldBody::Transform(Box::new(ConstantField(value))),
            });
            continue;
        }

        let from = entry_map.get("from").and_then(ConfigNode::as_str).map(str::to_string);
        let transform_node = entry_map
            .get("transform")
            .ok_or_else(|| SerializeError::InvalidSchema { where_: category.into(), reason: format!("entry `{name}` missing `transform`") })?;
        let is_whole_record = wants_whole_record(transform_node);
        let transformer = compile_transformer(transform_node)?;
        let ignore = compile_entry_ignore(entry_map, from.as_deref().unwrap_or(&name))?;
        fields.push(Field { name, from, object: None, ignore, is_whole_record, body: FieldBody::Transform(transformer) });
    }
    Ok(fields)
}

fn compile_entry_ignore(entry_map: &adapt_dsl::Mapping, default_field: &str) -> Result<Option<IgnoreTransformer>> {
    match entry_map.get("ignore") {
        Some(node) => Ok(Some(compile_ignore(node, default_field)?)),
        None => Ok(None),
    }
}

/// `inline`: entries may additionally be `array`/`extended_array` sub-schemas.
fn compile_inline_section(
    node: Option<&ConfigNode>,
    category: &str,
    declared: &mut HashSet<String>,
    key_set: &mut Vec<String>,
    dict_normalize: bool,
) -> Result<Vec<Field>> {
    let Some(node) = node else { return Ok(Vec::new()) };
    let entries = node
        .as_sequence()
        .ok_or_else(|| SerializeError::InvalidSchema { where_: category.into(), reason: "must be a sequence".into() })?;

    let mut fields = Vec::with_capacity(entries.len());
    for entry in entries {
        let entry_map = entry
            .as_mapping()
            .ok_or_else(|| SerializeError::InvalidSchema { where_: category.into(), reason: "entry must be a mapping".into() })?;
        let name = require_entry_str(entry_map, "name", category)?;
        let entry_type = entry_map.get("type").and_then(ConfigNode::as_str);

        match entry_type {
            Some("array") => {
                register_name(declared, category, &name)?;
                let from = require_entry_str(entry_map, "from", category)?;
                // The entry mapping IS the sub-schema: its own `inline`/
                // `derived`/`constants` keys sit alongside `name`/`type`/
                // `from`, not nested under a separate key.
                let sub = SerializerSchema::compile(entry, false)?;
                key_set.push(name.clone());
                fields.push(Field { name, from: Some(from), object: None, ignore: None, is_whole_record: false, body: FieldBody::Array(sub) });
            }
            Some("extended_array") => {
                register_name(declared, category, &name)?;
                let from = require_entry_str(entry_map, "from", category)?;
                let sub = SerializerSchema::compile(entry, dict_normalize)?;
                for key in &sub.key_set {
                    if !key_set.contains(key) {
                        key_set.push(key.clone());
                    }
                }
                fields.push(Field { name, from: Some(from), object: None, ignore: None, is_whole_record: false, body: FieldBody::ExtendedArray(sub) });
            }
            _ => {
                register_name(declared, category, &name)?;
                let object = entry_map.get("object").and_then(ConfigNode::as_str).map(str::to_string);
                let from = entry_map.get("from").and_then(ConfigNode::as_str).map(str::to_string);
                if object.is_none() && from.is_none() {
                    return Err(SerializeError::InvalidSchema {
                        where_: category.into(),
                        reason: format!("entry `{name}` missing `from`/`object`"),
                    });
                }
                let transform_node = entry_map
                    .get("transform")
                    .ok_or_else(|| SerializeError::InvalidSchema { where_: category.into(), reason: format!("entry `{name}` missing `transform`") })?;
                let is_whole_record = wants_whole_record(transform_node);
                let transformer = compile_transformer(transform_node)?;
                let default_field = from.as_deref().or(object.as_deref()).unwrap_or(&name);
                let ignore = compile_entry_ignore(entry_map, default_field)?;
                key_set.push(name.clone());
                fields.push(Field { name, from, object, ignore, is_whole_record, body: FieldBody::Transform(transformer) });
            }
        }
    }
    Ok(fields)
}

struct ConstantField(Value);
impl Transformer for ConstantField {
    fn apply(&self, _value: &Value) -> Result<Value> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt_dsl::parse_document;

    #[test]
    fn compiles_inline_derived_constants() {
        let yaml = r#"
inline:
  - name: campaign_id
    from: id
    transform: {type: integer}
derived:
  - name: campaign_id_str
    from: campaign_id
    transform: {type: string}
constants:
  - name: source
    value: adapt
"#;
        let node = parse_document(yaml).unwrap();
        let schema = SerializerSchema::compile(&node, false).unwrap();
        assert_eq!(schema.inline.len(), 1);
        assert_eq!(schema.derived.len(), 1);
        assert_eq!(schema.constants.len(), 1);
        assert_eq!(schema.key_set, vec!["campaign_id", "campaign_id_str", "source"]);
    }

    #[test]
    fn duplicate_field_name_across_categories_is_fatal() {
        let yaml = r#"
inline:
  - name: dup
    from: id
    transform: {type: integer}
constants:
  - name: dup
    value: x
"#;
        let node = parse_document(yaml).unwrap();
        let err = SerializerSchema::compile(&node, false).unwrap_err();
        assert!(matches!(err, SerializeError::DuplicateField(_)));
    }

    #[test]
    fn array_field_name_is_part_of_key_set() {
        let yaml = r#"
inline:
  - name: tags
    type: array
    from: tag_rows
    inline:
      - name: tag
        from: name
        transform: {type: string}
"#;
        let node = parse_document(yaml).unwrap();
        let schema = SerializerSchema::compile(&node, false).unwrap();
        assert_eq!(schema.key_set, vec!["tags"]);
    }

    #[test]
    fn extended_array_contributes_nested_keys_not_its_own_name() {
        let yaml = r#"
inline:
  - name: variants
    type: extended_array
    from: variant_rows
    inline:
      - name: sku
        from: sku
        transform: {type: string}
"#;
        let node = parse_document(yaml).unwrap();
        let schema = SerializerSchema::compile(&node, false).unwrap();
        assert_eq!(schema.key_set, vec!["sku"]);
    }
}
