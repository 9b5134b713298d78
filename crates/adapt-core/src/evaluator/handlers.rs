// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The closed set of `type` tags the Evaluator understands.

use adapt_dsl::{Mapping, Scalar, SentinelKind, Value, ValueMap};

use super::{Evaluator, Handler, unwrap_identity, wrap_identity};
use crate::error::EvalError;
use crate::formatter::{FormatTag, format_value, item_text};
use crate::store::Store;

fn bad_args(handler: &'static str, reason: impl Into<String>) -> EvalError {
    EvalError::InvalidArguments { handler, reason: reason.into() }
}

fn require_node<'a>(args: &'a Mapping, key: &str, handler: &'static str) -> Result<&'a adapt_dsl::ConfigNode, EvalError> {
    args.get(key).ok_or_else(|| bad_args(handler, format!("missing `{key}`")))
}

fn require_str<'a>(args: &'a Mapping, key: &str, handler: &'static str) -> Result<&'a str, EvalError> {
    require_node(args, key, handler)?
        .as_str()
        .ok_or_else(|| bad_args(handler, format!("`{key}` must be a string")))
}

fn optional_str<'a>(args: &'a Mapping, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|n| n.as_str())
}

fn optional_bool(args: &Mapping, key: &str) -> bool {
    match args.get(key).and_then(|n| n.as_scalar()) {
        Some(Scalar::Bool(b)) => *b,
        _ => false,
    }
}

/// `constant { value, split_on?, format_as? }`
pub struct ConstantHandler;
impl Handler for ConstantHandler {
    fn call(&self, eval: &Evaluator<'_>, args: &Mapping, store: &mut Store) -> Result<Value, EvalError> {
        let value_node = require_node(args, "value", "constant")?;
        let value = eval.evaluate(value_node, store)?;
        let split_on = optional_str(args, "split_on");
        let format_as = optional_str(args, "format_as").map(FormatTag::parse).transpose()?;
        format_value(&value, split_on, format_as)
    }
}

/// `external_input { key, required?, ignore_if?, split_on?, format_as? }` (store-consuming)
pub struct ExternalInputHandler;
impl Handler for ExternalInputHandler {
    fn call(&self, eval: &Evaluator<'_>, args: &Mapping, store: &mut Store) -> Result<Value, EvalError> {
        let key = require_str(args, "key", "external_input")?;
        let required = optional_bool(args, "required");

        let pill = Value::Sentinel(SentinelKind::NotFound);
        let raw = store.get(key, required, pill.clone());
        if required && raw == pill {
            return Err(EvalError::MissingInput(key.to_string()));
        }

        let ignore_if = match args.get("ignore_if") {
            Some(node) => eval.evaluate(node, store)?,
            None => Value::Sentinel(SentinelKind::Ignore),
        };
        if raw == ignore_if {
            return Ok(Value::Sentinel(SentinelKind::Ignore));
        }

        let split_on = optional_str(args, "split_on");
        let format_as = optional_str(args, "format_as").map(FormatTag::parse).transpose()?;
        format_value(&raw, split_on, format_as)
    }
}

/// `dict { items: mapping<name, typedNode> }` (store-consuming)
pub struct DictHandler;
impl Handler for DictHandler {
    fn call(&self, eval: &Evaluator<'_>, args: &Mapping, store: &mut Store) -> Result<Value, EvalError> {
        let items = require_node(args, "items", "dict")?
            .as_mapping()
            .ok_or_else(|| bad_args("dict", "`items` must be a mapping"))?;
        let mut out = ValueMap::with_capacity(items.len());
        for (name, node) in items.iter() {
            out.insert(name, eval.evaluate(node, store)?);
        }
        Ok(Value::Map(out))
    }
}

/// `list { items: sequence<node> }` (store-consuming)
pub struct ListHandler;
impl Handler for ListHandler {
    fn call(&self, eval: &Evaluator<'_>, args: &Mapping, store: &mut Store) -> Result<Value, EvalError> {
        let items = require_node(args, "items", "list")?
            .as_sequence()
            .ok_or_else(|| bad_args("list", "`items` must be a sequence"))?;
        let mut out = Vec::with_capacity(items.len());
        for node in items {
            out.push(eval.evaluate(node, store)?);
        }
        Ok(Value::List(out))
    }
}

/// `filter { schema: {key, operator, value}, items: mapping<name, {operator, value}>, json_dumps? }` (store-consuming)
pub struct FilterHandler;
impl Handler for FilterHandler {
    fn call(&self, eval: &Evaluator<'_>, args: &Mapping, store: &mut Store) -> Result<Value, EvalError> {
        let schema = require_node(args, "schema", "filter")?
            .as_mapping()
            .ok_or_else(|| bad_args("filter", "`schema` must be a mapping"))?;
        let key_name = require_str(schema, "key", "filter")?;
        let operator_name = require_str(schema, "operator", "filter")?;
        let value_name = require_str(schema, "value", "filter")?;

        let items = require_node(args, "items", "filter")?
            .as_mapping()
            .ok_or_else(|| bad_args("filter", "`items` must be a mapping"))?;

        let mut rows = Vec::new();
        for (name, entry) in items.iter() {
            let entry_map = entry.as_mapping().ok_or_else(|| bad_args("filter", format!("entry `{name}` must be a mapping")))?;
            let operator = eval.evaluate(require_node(entry_map, "operator", "filter")?, store)?;
            let value = eval.evaluate(require_node(entry_map, "value", "filter")?, store)?;
            if value.is_sentinel(SentinelKind::Ignore) {
                continue;
            }
            let mut row = ValueMap::with_capacity(3);
            row.insert(key_name, Value::string(name));
            row.insert(operator_name, operator);
            row.insert(value_name, value);
            rows.push(Value::Map(row));
        }

        let result = Value::List(rows);
        if optional_bool(args, "json_dumps") {
            Ok(Value::String(serde_json::to_string(&result.to_json())?))
        } else {
            Ok(result)
        }
    }
}

/// `sql_query { query }`
pub struct SqlQueryHandler;
impl Handler for SqlQueryHandler {
    fn call(&self, eval: &Evaluator<'_>, args: &Mapping, store: &mut Store) -> Result<Value, EvalError> {
        let query_node = require_node(args, "query", "sql_query")?;
        eval.evaluate(query_node, store)
    }
}

/// `sql_filter { items: mapping<column, {operator, value}> }` (store-consuming)
pub struct SqlFilterHandler;
impl Handler for SqlFilterHandler {
    fn call(&self, eval: &Evaluator<'_>, args: &Mapping, store: &mut Store) -> Result<Value, EvalError> {
        let items = require_node(args, "items", "sql_filter")?
            .as_mapping()
            .ok_or_else(|| bad_args("sql_filter", "`items` must be a mapping"))?;

        let mut clauses = Vec::new();
        for (column, entry) in items.iter() {
            let entry_map = entry
                .as_mapping()
                .ok_or_else(|| bad_args("sql_filter", format!("entry `{column}` must be a mapping")))?;
            let operator = eval.evaluate(require_node(entry_map, "operator", "sql_filter")?, store)?;
            let value = eval.evaluate(require_node(entry_map, "value", "sql_filter")?, store)?;
            if value.is_sentinel(SentinelKind::Ignore) {
                continue;
            }
            let operator_str = operator.as_str().ok_or_else(|| bad_args("sql_filter", "`operator` must be a string"))?;
            clauses.push(format!("{column} {operator_str} {}", item_text(&value)));
        }

        Ok(Value::String(clauses.join(" AND ")))
    }
}

/// `query_builder { query: typedNode, filters: typedNode }` (store-consuming)
pub struct QueryBuilderHandler;
impl Handler for QueryBuilderHandler {
    fn call(&self, eval: &Evaluator<'_>, args: &Mapping, store: &mut Store) -> Result<Value, EvalError> {
        let query = eval.evaluate(require_node(args, "query", "query_builder")?, store)?;
        let filters = eval.evaluate(require_node(args, "filters", "query_builder")?, store)?;
        let query_str = query.as_str().ok_or_else(|| bad_args("query_builder", "`query` must evaluate to a string"))?;
        let filters_str = filters.as_str().ok_or_else(|| bad_args("query_builder", "`filters` must evaluate to a string"))?;

        let combined = if filters_str.is_empty() {
            query_str.to_string()
        } else {
            format!("{query_str} WHERE {filters_str}")
        };
        Ok(Value::String(combined))
    }
}

/// `callable { module, class, method }`
pub struct CallableHandler;
impl Handler for CallableHandler {
    fn call(&self, _eval: &Evaluator<'_>, args: &Mapping, _store: &mut Store) -> Result<Value, EvalError> {
        let module = require_str(args, "module", "callable")?.to_string();
        let class = require_str(args, "class", "callable")?.to_string();
        let method = require_str(args, "method", "callable")?.to_string();
        Ok(Value::Callable(adapt_dsl::Callable { module, class, method }))
    }
}

/// `instance { module, class, arguments }` (store-consuming)
///
/// Construction is dispatched to the embedder's registered `(module, class,
/// "__new__")` function. The result is tagged with its `(module, class)`
/// identity so a later `from_authorizer` node can dispatch a further method
/// against it.
pub struct InstanceHandler;
impl Handler for InstanceHandler {
    fn call(&self, eval: &Evaluator<'_>, args: &Mapping, store: &mut Store) -> Result<Value, EvalError> {
        let module = require_str(args, "module", "instance")?.to_string();
        let class = require_str(args, "class", "instance")?.to_string();
        let arguments = eval.evaluate(require_node(args, "arguments", "instance")?, store)?;

        let constructed = eval.callables().call(&module, &class, "__new__", arguments)?;
        Ok(wrap_identity(&module, &class, constructed))
    }
}

/// `initializer { client, arguments }` (store-consuming)
pub struct InitializerHandler;
impl Handler for InitializerHandler {
    fn call(&self, eval: &Evaluator<'_>, args: &Mapping, store: &mut Store) -> Result<Value, EvalError> {
        let client = eval.evaluate_callable(require_node(args, "client", "initializer")?, store)?;
        let arguments = eval.evaluate(require_node(args, "arguments", "initializer")?, store)?;

        let result = eval.callables().call(&client.module, &client.class, &client.method, arguments)?;
        Ok(wrap_identity(&client.module, &client.class, result))
    }
}

/// `from_authorizer { method, arguments }` (store-consuming)
pub struct FromAuthorizerHandler;
impl Handler for FromAuthorizerHandler {
    fn call(&self, eval: &Evaluator<'_>, args: &Mapping, store: &mut Store) -> Result<Value, EvalError> {
        if !store.contains_key("authorization") {
            return Err(EvalError::MissingInput("authorization".to_string()));
        }
        let auth = store.get("authorization", true, Value::Null);
        let (module, class, identity_value) = unwrap_identity(&auth)
            .ok_or_else(|| bad_args("from_authorizer", "`authorization` is not a tagged instance"))?;

        let method = require_str(args, "method", "from_authorizer")?;
        let arguments = eval.evaluate(require_node(args, "arguments", "from_authorizer")?, store)?;

        let mut call_arg = ValueMap::new();
        call_arg.insert("self", identity_value.clone());
        call_arg.insert("arguments", arguments);

        eval.callables().call(module, class, method, Value::Map(call_arg))
    }
}

/// `pipeline { name, client, arguments?, forward_to? }` (store-consuming)
///
/// Produces a descriptor value, not a concrete [`crate::pipeline::Item`] —
/// see [`crate::pipeline::Item::from_descriptor`] for the conversion an
/// embedder performs once a config tree has fully evaluated.
pub struct PipelineHandler;
impl Handler for PipelineHandler {
    fn call(&self, eval: &Evaluator<'_>, args: &Mapping, store: &mut Store) -> Result<Value, EvalError> {
        let name = require_str(args, "name", "pipeline")?.to_string();
        let client = eval.evaluate_callable(require_node(args, "client", "pipeline")?, store)?;

        let arguments = match args.get("arguments") {
            Some(node) => eval.evaluate(node, store)?,
            None => Value::Map(ValueMap::new()),
        };

        let mut forward_to = Vec::new();
        if let Some(node) = args.get("forward_to") {
            let map = node.as_mapping().ok_or_else(|| bad_args("pipeline", "`forward_to` must be a mapping"))?;
            for (arg_name, target) in map.iter() {
                let target_str = target
                    .as_str()
                    .ok_or_else(|| bad_args("pipeline", format!("`forward_to.{arg_name}` must be a string")))?;
                let mut entry = ValueMap::with_capacity(2);
                entry.insert("forward_to", Value::string(target_str));
                entry.insert("name", Value::string(arg_name));
                forward_to.push(Value::Map(entry));
            }
        }

        let mut descriptor = ValueMap::with_capacity(4);
        descriptor.insert("name", Value::string(name));
        descriptor.insert("processor", Value::Callable(client));
        descriptor.insert("arguments", arguments);
        descriptor.insert("forward_to", Value::List(forward_to));
        Ok(Value::Map(descriptor))
    }
}
