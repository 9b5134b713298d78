// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tagged recursive dispatch over [`ConfigNode`] trees.
//!
//! A typed mapping (one carrying a `type` key) is looked up in the
//! [`HandlerRegistry`] and invoked with its other entries as named
//! arguments; the Store is threaded alongside for handlers that need it.
//! A non-typed node is returned as-is — the tree is only walked where a
//! `type` tag drives it.

mod handlers;

use std::collections::HashMap;

use adapt_dsl::{Callable, ConfigNode, Mapping, Scalar, Value};
use once_cell::sync::Lazy;

use crate::callable_registry::CallableRegistry;
use crate::error::EvalError;
use crate::store::Store;

/// One entry of the closed handler set a `type` tag may name.
pub trait Handler: Send + Sync {
    fn call(&self, eval: &Evaluator<'_>, args: &Mapping, store: &mut Store) -> Result<Value, EvalError>;
}

type HandlerRegistry = HashMap<&'static str, Box<dyn Handler>>;

/// Built once, never mutated at runtime — the set of `type` tags this
/// Evaluator understands is fixed at compile time.
static HANDLERS: Lazy<HandlerRegistry> = Lazy::new(|| {
    let mut m: HandlerRegistry = HashMap::new();
    m.insert("constant", Box::new(handlers::ConstantHandler));
    m.insert("external_input", Box::new(handlers::ExternalInputHandler));
    m.insert("dict", Box::new(handlers::DictHandler));
    m.insert("list", Box::new(handlers::ListHandler));
    m.insert("filter", Box::new(handlers::FilterHandler));
    m.insert("sql_query", Box::new(handlers::SqlQueryHandler));
    m.insert("sql_filter", Box::new(handlers::SqlFilterHandler));
    m.insert("query_builder", Box::new(handlers::QueryBuilderHandler));
    m.insert("callable", Box::new(handlers::CallableHandler));
    m.insert("instance", Box::new(handlers::InstanceHandler));
    m.insert("initializer", Box::new(handlers::InitializerHandler));
    m.insert("from_authorizer", Box::new(handlers::FromAuthorizerHandler));
    m.insert("pipeline", Box::new(handlers::PipelineHandler));
    m
});

/// Converts a non-typed node to its runtime value form with no dispatch —
/// the evaluator's rendition of "return the node as-is".
pub(crate) fn config_node_to_value(node: &ConfigNode) -> Value {
    match node {
        ConfigNode::Scalar(Scalar::Null) => Value::Null,
        ConfigNode::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
        ConfigNode::Scalar(Scalar::Int(i)) => Value::Int(*i),
        ConfigNode::Scalar(Scalar::Float(f)) => Value::Float(*f),
        ConfigNode::Scalar(Scalar::String(s)) => Value::String(s.clone()),
        ConfigNode::Sequence(items) => Value::List(items.iter().map(config_node_to_value).collect()),
        ConfigNode::Mapping(m) => {
            Value::Map(m.iter().map(|(k, v)| (k.to_string(), config_node_to_value(v))).collect())
        }
    }
}

/// An instance constructed via `instance`/`initializer`, tagged with the
/// `(module, class)` pair of the callable that produced it so a later
/// `from_authorizer` node can dispatch a further method against the same
/// native object.
pub(crate) fn wrap_identity(module: &str, class: &str, value: Value) -> Value {
    let mut m = adapt_dsl::ValueMap::new();
    m.insert("__module__", Value::string(module));
    m.insert("__class__", Value::string(class));
    m.insert("__value__", value);
    Value::Map(m)
}

pub(crate) fn unwrap_identity(value: &Value) -> Option<(&str, &str, &Value)> {
    let map = value.as_map()?;
    let module = map.get("__module__")?.as_str()?;
    let class = map.get("__class__")?.as_str()?;
    let inner = map.get("__value__")?;
    Some((module, class, inner))
}

/// Evaluates a [`ConfigNode`] tree against an ambient [`Store`], dispatching
/// typed mappings through the handler registry.
pub struct Evaluator<'a> {
    callables: &'a CallableRegistry,
}

impl<'a> Evaluator<'a> {
    pub fn new(callables: &'a CallableRegistry) -> Self {
        Self { callables }
    }

    pub fn callables(&self) -> &CallableRegistry {
        self.callables
    }

    /// For a typed mapping, look up and invoke its handler. For anything
    /// else, return the node converted to a value with no further dispatch.
    pub fn evaluate(&self, node: &ConfigNode, store: &mut Store) -> Result<Value, EvalError> {
        if !node.is_typed() {
            return Ok(config_node_to_value(node));
        }
        let (tag, args) = node.require_typed()?;
        let handler = HANDLERS.get(tag).ok_or_else(|| EvalError::UnknownType(tag.to_string()))?;
        handler.call(self, &args, store)
    }

    /// Evaluate a node expected to yield a [`Callable`] reference.
    pub(crate) fn evaluate_callable(&self, node: &ConfigNode, store: &mut Store) -> Result<Callable, EvalError> {
        match self.evaluate(node, store)? {
            Value::Callable(c) => Ok(c),
            other => Err(EvalError::InvalidArguments {
                handler: "callable",
                reason: format!("expected a callable reference, got {other:?}"),
            }),
        }
    }
}
