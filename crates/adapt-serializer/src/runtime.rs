// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The streaming per-record state machine: build accumulator, walk
//! inline/derived/constants, expand `extended_array` spreads.

use adapt_dsl::{SentinelKind, Value, ValueMap};

use crate::error::Result;
use crate::schema::{Field, FieldBody, SerializerSchema};

/// Flat (non-dotted) key lookup — matches the original's `row[field["from"]]`,
/// which indexes a single level regardless of whether the key happens to
/// contain a `.`. A missing key yields `Null`.
fn lookup_field(source: &Value, key: &str) -> Value {
    source.as_map().and_then(|m| m.get(key)).cloned().unwrap_or(Value::Null)
}

/// Resolve an `object` selector's dotted path (`a.b.c`), walking one segment
/// at a time against nested maps — `_get_inner_object`'s loop. A missing
/// segment at any depth yields `Value::Sentinel(SentinelKind::ObjectNotFound)`
/// (`_NESTED_OBJECT_NOT_FOUND`), which the caller must check for and
/// short-circuit on *before* running the field's transformer — it never
/// reaches the transformer itself.
fn resolve_object(source: &Value, path: &str) -> Value {
    let mut current = source.clone();
    for segment in path.split('.') {
        match current.as_map().and_then(|m| m.get(segment)) {
            Some(next) => current = next.clone(),
            None => {
                tracing::debug!(path, segment, "object selector segment not found");
                return Value::Sentinel(SentinelKind::ObjectNotFound);
            }
        }
    }
    current
}

/// Lazily serialize a stream of source records against a compiled schema.
/// Each input record expands into zero, one, or many output records
/// depending on the schema's `extended_array` fields.
pub fn serialize_records<'a>(
    schema: &'a SerializerSchema,
    records: impl Iterator<Item = Value> + 'a,
) -> impl Iterator<Item = Result<Value>> + 'a {
    records.flat_map(move |record| match serialize_one(schema, &record) {
        Ok(rows) => rows.into_iter().map(Ok).collect::<Vec<_>>(),
        Err(e) => vec![Err(e)],
    })
}

fn build_accumulator(schema: &SerializerSchema) -> ValueMap {
    let mut acc = ValueMap::new();
    if schema.dict_normalize {
        for key in &schema.key_set {
            acc.insert(key.clone(), Value::Null);
        }
    }
    acc
}

/// Run a field's `ignore` pre-gate against `whole_record`, if any present.
/// Returns `Some(value)` if the pre-gate fired (and should be written as the
/// field's value directly, skipping the field's own transformer).
fn apply_ignore(field: &Field, whole_record: &Value) -> Result<Option<Value>> {
    let Some(ignore) = &field.ignore else { return Ok(None) };
    let result = ignore.apply(whole_record)?;
    if result.is_sentinel(SentinelKind::DoNotIgnore) {
        Ok(None)
    } else {
        Ok(Some(result))
    }
}

/// Process one `Transform`-bodied field, writing its result into
/// `accumulator`. Two different trees are in play and they are NOT the
/// same thing:
/// - `source_for_from`: what `field.object`/`field.from` resolve against —
///   the raw source record for `inline` fields, the accumulator-as-a-record
///   for `derived` fields.
/// - `whole_record`: what `ignore`/`case` receive instead of a single
///   resolved value — for `inline` fields this is the raw source record
///   (unprocessed, matching the field's own `from` tree), for `derived`
///   fields it is the accumulator built so far. The two coincide for
///   `derived` fields but not for `inline` ones.
///
/// `field.object`, when present, is resolved first (`_get_inner_object`): a
/// missing nested segment writes `null` and returns immediately, skipping
/// `ignore` and the transformer entirely — it never reaches either one.
fn process_transform_field(
    field: &Field,
    transformer: &dyn crate::transformer::Transformer,
    source_for_from: &Value,
    whole_record: &Value,
    accumulator: &mut ValueMap,
) -> Result<()> {
    let object_scope = match &field.object {
        Some(path) => {
            let resolved = resolve_object(source_for_from, path);
            if resolved.is_sentinel(SentinelKind::ObjectNotFound) {
                accumulator.insert(field.name.clone(), Value::Null);
                return Ok(());
            }
            resolved
        }
        None => source_for_from.clone(),
    };

    if let Some(value) = apply_ignore(field, whole_record)? {
        accumulator.insert(field.name.clone(), value);
        return Ok(());
    }

    let input = if field.is_whole_record {
        whole_record.clone()
    } else {
        match &field.from {
            Some(key) => lookup_field(&object_scope, key),
            None => object_scope,
        }
    };
    let value = transformer.apply(&input)?;
    accumulator.insert(field.name.clone(), value);
    Ok(())
}

/// One `array`/`extended_array` field's source rows, each recursively
/// serialized against its own sub-schema. A sub-row may itself expand via a
/// nested `extended_array`, so this always returns a flat list of rows.
fn serialize_rows(sub_schema: &SerializerSchema, source_list: &Value) -> Result<Vec<Value>> {
    let items: &[Value] = source_list.as_list().unwrap_or(&[]);
    let mut rows = Vec::new();
    for item in items {
        rows.extend(serialize_one(sub_schema, item)?);
    }
    Ok(rows)
}

fn process_inline_fields(schema: &SerializerSchema, record: &Value, accumulator: &mut ValueMap) -> Result<Vec<ValueMap>> {
    // extended_array fields are deferred; everything else writes directly
    // into `accumulator`. Every deferred sub-record's overlay is collected
    // into one flat list, in declaration order, across all extended_array
    // fields at this level — §4.6 spreads one sub-record per output row,
    // it does not combine sub-records from different fields into one row.
    let mut deferred: Vec<ValueMap> = Vec::new();

    for field in &schema.inline {
        match &field.body {
            FieldBody::Transform(transformer) => {
                // Inline fields: `ignore`/`case` see the raw source record,
                // not the accumulator being built.
                process_transform_field(field, transformer.as_ref(), record, record, accumulator)?;
            }
            FieldBody::Array(sub_schema) => {
                let source_list = field.from.as_deref().map(|p| lookup_field(record, p)).unwrap_or(Value::Null);
                let rows = serialize_rows(sub_schema, &source_list)?;
                accumulator.insert(field.name.clone(), Value::List(rows));
            }
            FieldBody::ExtendedArray(sub_schema) => {
                let source_list = field.from.as_deref().map(|p| lookup_field(record, p)).unwrap_or(Value::Null);
                let rows = serialize_rows(sub_schema, &source_list)?;
                // `field.name` is never an output key for extended_array.
                deferred.extend(rows.into_iter().filter_map(|r| r.as_map().cloned()));
            }
        }
    }

    Ok(deferred)
}

fn process_flat_fields(fields: &[Field], accumulator: &mut ValueMap) -> Result<()> {
    for field in fields {
        let FieldBody::Transform(transformer) = &field.body else {
            unreachable!("derived/constants fields are always FieldBody::Transform")
        };
        // Derived/constants fields: `ignore`/`case` and `from` all resolve
        // against the accumulator built so far — the two trees coincide.
        let snapshot = Value::Map(accumulator.clone());
        process_transform_field(field, transformer.as_ref(), &snapshot, &snapshot, accumulator)?;
    }
    Ok(())
}

/// Serialize a single source record against `schema`, returning the output
/// records it expands into. With no `extended_array` fields, always exactly
/// one. With `extended_array` fields present, `1 + N` records — the base
/// accumulator first, then one record per sub-record collected across all
/// `extended_array` fields in declaration order, each the base accumulator
/// overlaid with that one sub-record's fields (spec §4.6, §8 invariant 3).
pub fn serialize_one(schema: &SerializerSchema, record: &Value) -> Result<Vec<Value>> {
    let mut accumulator = build_accumulator(schema);

    let deferred = process_inline_fields(schema, record, &mut accumulator)?;
    process_flat_fields(&schema.derived, &mut accumulator)?;
    process_flat_fields(&schema.constants, &mut accumulator)?;

    if deferred.is_empty() {
        return Ok(vec![Value::Map(accumulator)]);
    }

    let mut out = Vec::with_capacity(1 + deferred.len());
    out.push(Value::Map(accumulator.clone()));
    for overlay in deferred {
        let mut row = accumulator.clone();
        for (key, value) in overlay.iter() {
            row.insert(key.to_string(), value.clone());
        }
        out.push(Value::Map(row));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt_dsl::parse_document;

    fn compile(yaml: &str) -> SerializerSchema {
        let node = parse_document(yaml).unwrap();
        SerializerSchema::compile(&node, true).unwrap()
    }

    #[test]
    fn simple_inline_and_derived_and_constants() {
        let schema = compile(
            r#"
inline:
  - name: id
    from: id
    transform: {type: integer}
derived:
  - name: id_label
    from: id
    transform: {type: string}
constants:
  - name: source
    value: adapt
"#,
        );
        let mut source = ValueMap::new();
        source.insert("id", Value::string("7"));
        let rows = serialize_one(&schema, &Value::Map(source)).unwrap();
        assert_eq!(rows.len(), 1);
        let record = rows[0].as_map().unwrap();
        assert_eq!(record.get("id"), Some(&Value::Int(7)));
        assert_eq!(record.get("id_label"), Some(&Value::string("7")));
        assert_eq!(record.get("source"), Some(&Value::string("adapt")));
    }

    #[test]
    fn missing_nested_object_resolves_to_null() {
        let schema = compile(
            r#"
inline:
  - name: city
    object: address
    from: city
    transform: {type: string}
"#,
        );
        let mut source = ValueMap::new();
        source.insert("name", Value::string("acme"));
        let rows = serialize_one(&schema, &Value::Map(source)).unwrap();
        let record = rows[0].as_map().unwrap();
        assert_eq!(record.get("city"), Some(&Value::Null));
    }

    /// Spec §8 S6: `promoted_object.custom_event_str` absent from the
    /// record. An `object` selector whose first segment is already missing
    /// must short-circuit to `null` without ever invoking the field's
    /// transformer — an `integer`/`currency` transform proves this, since
    /// feeding either one `Value::Null` directly would raise, not yield
    /// `null`.
    #[test]
    fn object_not_found_skips_transformer_with_no_error() {
        let schema = compile(
            r#"
inline:
  - name: event_value
    object: promoted_object.custom_event_str
    from: amount
    transform: {type: integer}
  - name: event_price
    object: promoted_object.custom_event_str
    from: amount
    transform: {type: currency, multiplier: 0.01}
"#,
        );
        let mut source = ValueMap::new();
        source.insert("name", Value::string("acme"));
        let rows = serialize_one(&schema, &Value::Map(source)).unwrap();
        let record = rows[0].as_map().unwrap();
        assert_eq!(record.get("event_value"), Some(&Value::Null));
        assert_eq!(record.get("event_price"), Some(&Value::Null));
    }

    #[test]
    fn extended_array_expands_to_base_plus_one_row_per_sub_record() {
        let schema = compile(
            r#"
inline:
  - name: order_id
    from: id
    transform: {type: integer}
  - name: line
    type: extended_array
    from: lines
    inline:
      - name: sku
        from: sku
        transform: {type: string}
"#,
        );
        let mut line_a = ValueMap::new();
        line_a.insert("sku", Value::string("A"));
        let mut line_b = ValueMap::new();
        line_b.insert("sku", Value::string("B"));
        let mut source = ValueMap::new();
        source.insert("id", Value::Int(1));
        source.insert("lines", Value::List(vec![Value::Map(line_a), Value::Map(line_b)]));

        let rows = serialize_one(&schema, &Value::Map(source)).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].as_map().unwrap().get("sku"), Some(&Value::Null));
        assert_eq!(rows[1].as_map().unwrap().get("sku"), Some(&Value::string("A")));
        assert_eq!(rows[2].as_map().unwrap().get("sku"), Some(&Value::string("B")));
        for row in &rows {
            assert_eq!(row.as_map().unwrap().get("order_id"), Some(&Value::Int(1)));
        }
    }

    #[test]
    fn empty_extended_array_still_yields_base_record() {
        let schema = compile(
            r#"
inline:
  - name: order_id
    from: id
    transform: {type: integer}
  - name: line
    type: extended_array
    from: lines
    inline:
      - name: sku
        from: sku
        transform: {type: string}
"#,
        );
        let mut source = ValueMap::new();
        source.insert("id", Value::Int(5));
        source.insert("lines", Value::List(vec![]));

        let rows = serialize_one(&schema, &Value::Map(source)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].as_map().unwrap().get("order_id"), Some(&Value::Int(5)));
    }

    #[test]
    fn array_field_collects_sub_rows_without_expanding() {
        let schema = compile(
            r#"
inline:
  - name: tags
    type: array
    from: tag_rows
    inline:
      - name: tag
        from: name
        transform: {type: string}
"#,
        );
        let mut t1 = ValueMap::new();
        t1.insert("name", Value::string("x"));
        let mut t2 = ValueMap::new();
        t2.insert("name", Value::string("y"));
        let mut source = ValueMap::new();
        source.insert("tag_rows", Value::List(vec![Value::Map(t1), Value::Map(t2)]));

        let rows = serialize_one(&schema, &Value::Map(source)).unwrap();
        assert_eq!(rows.len(), 1);
        let tags = rows[0].as_map().unwrap().get("tags").unwrap().as_list().unwrap();
        assert_eq!(tags.len(), 2);
    }

    /// Spec §8 S5: nested extended_array (ad_sets -> ads). One ad-set with
    /// two ads, one ad-set with none. Top level count is 1 (base) + the
    /// flattened row count from recursively expanding each ad-set (which
    /// itself already spread its own `ads`).
    #[test]
    fn nested_extended_array_flattens_one_level_deeper() {
        let schema = compile(
            r#"
inline:
  - name: ad_sets
    type: extended_array
    from: ad_sets
    inline:
      - name: ad_set_name
        from: name
        transform: {type: string}
      - name: ads
        type: extended_array
        from: ads
        inline:
          - name: ad_name
            from: name
            transform: {type: string}
"#,
        );

        let mut ad1 = ValueMap::new();
        ad1.insert("name", Value::string("ad1"));
        let mut ad2 = ValueMap::new();
        ad2.insert("name", Value::string("ad2"));
        let mut a1 = ValueMap::new();
        a1.insert("name", Value::string("A1"));
        a1.insert("ads", Value::List(vec![Value::Map(ad1), Value::Map(ad2)]));
        let mut a2 = ValueMap::new();
        a2.insert("name", Value::string("A2"));
        a2.insert("ads", Value::List(vec![]));

        let mut source = ValueMap::new();
        source.insert("ad_sets", Value::List(vec![Value::Map(a1), Value::Map(a2)]));

        let rows = serialize_one(&schema, &Value::Map(source)).unwrap();
        // A1 spreads to 1 (base) + 2 ads = 3 rows; A2 spreads to 1 (base, no
        // ads) = 1 row. Flattened: 4 sub-records, plus the top-level base: 5.
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].as_map().unwrap().get("ad_set_name"), Some(&Value::Null));
    }
}
