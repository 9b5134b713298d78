// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The pipeline executor: a trivial ordered map of named steps, forwarding
//! results as named arguments to later steps. A thin scheduler, not the hard
//! part of this toolkit.

use adapt_dsl::{Callable, OrderedMap, Value, ValueMap};

use crate::callable_registry::CallableRegistry;
use crate::error::EvalError;

/// One entry of a `pipeline` node's `forward_to` mapping: write this step's
/// result into `forward_to`'s arguments under `name`.
#[derive(Debug, Clone)]
pub struct ForwardEntry {
    pub forward_to: String,
    pub name: String,
}

/// One step produced by evaluating a `pipeline` typed node.
#[derive(Debug, Clone)]
pub struct Item {
    pub name: String,
    pub processor: Callable,
    pub arguments: ValueMap,
    pub forward_to: Vec<ForwardEntry>,
}

impl Item {
    /// Convert the descriptor value a `pipeline` node evaluates to (see
    /// `evaluator::handlers::PipelineHandler`) into a concrete step. The
    /// descriptor's shape is this crate's own convention, not part of any
    /// wire format: `{name, processor, arguments, forward_to}`.
    pub fn from_descriptor(value: &Value) -> Result<Self, EvalError> {
        let map = value
            .as_map()
            .ok_or_else(|| EvalError::InvalidArguments { handler: "pipeline", reason: "descriptor must be a mapping".into() })?;

        let name = map
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| EvalError::InvalidArguments { handler: "pipeline", reason: "descriptor missing `name`".into() })?
            .to_string();

        let processor = match map.get("processor") {
            Some(Value::Callable(c)) => c.clone(),
            _ => {
                return Err(EvalError::InvalidArguments {
                    handler: "pipeline",
                    reason: "descriptor's `processor` must be a callable".into(),
                });
            }
        };

        let arguments = match map.get("arguments") {
            Some(Value::Map(m)) => m.clone(),
            _ => ValueMap::new(),
        };

        let mut forward_to = Vec::new();
        if let Some(Value::List(entries)) = map.get("forward_to") {
            for entry in entries {
                let entry_map = entry.as_map().ok_or_else(|| EvalError::InvalidArguments {
                    handler: "pipeline",
                    reason: "`forward_to` entries must be mappings".into(),
                })?;
                let forward_to_name = entry_map
                    .get("forward_to")
                    .and_then(Value::as_str)
                    .ok_or_else(|| EvalError::InvalidArguments { handler: "pipeline", reason: "entry missing `forward_to`".into() })?
                    .to_string();
                let arg_name = entry_map
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| EvalError::InvalidArguments { handler: "pipeline", reason: "entry missing `name`".into() })?
                    .to_string();
                forward_to.push(ForwardEntry { forward_to: forward_to_name, name: arg_name });
            }
        }

        Ok(Item { name, processor, arguments, forward_to })
    }
}

/// An insertion-ordered set of steps. `run` invokes each step's processor in
/// declared order and threads results to declared downstream steps.
#[derive(Debug, Default)]
pub struct Pipeline {
    items: OrderedMap<Item>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a step. Re-adding a name already present is fatal.
    pub fn add_item(&mut self, item: Item) -> Result<(), EvalError> {
        if self.items.contains_key(&item.name) {
            return Err(EvalError::PipelineNameExists(item.name));
        }
        self.items.insert(item.name.clone(), item);
        Ok(())
    }

    /// Run every step in insertion order, invoking `processor(**arguments)`
    /// through `registry`, then forwarding each result per the step's
    /// `forward_to` entries. Returns the `(name, result)` pairs in run order.
    pub fn run(&mut self, registry: &CallableRegistry) -> Result<Vec<(String, Value)>, EvalError> {
        let order: Vec<String> = self.items.keys().map(str::to_string).collect();
        let mut results = Vec::with_capacity(order.len());

        for name in order {
            let (processor, arguments, forward_to) = {
                let item = self.items.get(&name).expect("name came from self.items.keys()");
                (item.processor.clone(), item.arguments.clone(), item.forward_to.clone())
            };

            tracing::debug!(step = %name, "running pipeline step");
            let args_value = Value::Map(arguments);
            let result = registry.call(&processor.module, &processor.class, &processor.method, args_value)?;

            for entry in &forward_to {
                let target = self
                    .items
                    .get_mut(&entry.forward_to)
                    .ok_or_else(|| EvalError::PipelineTargetNotFound(entry.forward_to.clone()))?;
                if target.arguments.contains_key(&entry.name) {
                    return Err(EvalError::PipelineArgumentExists {
                        item: entry.forward_to.clone(),
                        arg: entry.name.clone(),
                    });
                }
                target.arguments.insert(entry.name.clone(), result.clone());
            }

            results.push((name, result));
        }

        Ok(results)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapt_dsl::ValueMap;

    fn noop_registry() -> CallableRegistry {
        let mut reg = CallableRegistry::new();
        reg.register("pkg", "Cls", "echo", |v| Ok(v));
        reg.register("pkg", "Cls", "mark", |_| Ok(Value::string("marked")));
        reg
    }

    fn callable(method: &str) -> Callable {
        Callable {
            module: "pkg".to_string(),
            class: "Cls".to_string(),
            method: method.to_string(),
        }
    }

    #[test]
    fn runs_steps_in_insertion_order() {
        let mut pipeline = Pipeline::new();
        pipeline
            .add_item(Item {
                name: "a".into(),
                processor: callable("mark"),
                arguments: ValueMap::new(),
                forward_to: vec![],
            })
            .unwrap();
        pipeline
            .add_item(Item {
                name: "b".into(),
                processor: callable("mark"),
                arguments: ValueMap::new(),
                forward_to: vec![],
            })
            .unwrap();

        let results = pipeline.run(&noop_registry()).unwrap();
        assert_eq!(results.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn forwards_result_into_downstream_arguments() {
        let mut pipeline = Pipeline::new();
        pipeline
            .add_item(Item {
                name: "producer".into(),
                processor: callable("mark"),
                arguments: ValueMap::new(),
                forward_to: vec![ForwardEntry {
                    forward_to: "consumer".into(),
                    name: "upstream".into(),
                }],
            })
            .unwrap();
        pipeline
            .add_item(Item {
                name: "consumer".into(),
                processor: callable("echo"),
                arguments: ValueMap::new(),
                forward_to: vec![],
            })
            .unwrap();

        let results = pipeline.run(&noop_registry()).unwrap();
        let (_, consumer_result) = &results[1];
        match consumer_result {
            Value::Map(m) => assert_eq!(m.get("upstream"), Some(&Value::string("marked"))),
            other => panic!("expected a map, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_name_is_fatal() {
        let mut pipeline = Pipeline::new();
        pipeline
            .add_item(Item {
                name: "a".into(),
                processor: callable("echo"),
                arguments: ValueMap::new(),
                forward_to: vec![],
            })
            .unwrap();
        let err = pipeline
            .add_item(Item {
                name: "a".into(),
                processor: callable("echo"),
                arguments: ValueMap::new(),
                forward_to: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, EvalError::PipelineNameExists(_)));
    }

    #[test]
    fn forwarding_to_missing_target_is_fatal() {
        let mut pipeline = Pipeline::new();
        pipeline
            .add_item(Item {
                name: "a".into(),
                processor: callable("mark"),
                arguments: ValueMap::new(),
                forward_to: vec![ForwardEntry {
                    forward_to: "nope".into(),
                    name: "x".into(),
                }],
            })
            .unwrap();
        let err = pipeline.run(&noop_registry()).unwrap_err();
        assert!(matches!(err, EvalError::PipelineTargetNotFound(_)));
    }

    #[test]
    fn forwarding_into_an_existing_argument_name_is_fatal() {
        let mut pipeline = Pipeline::new();
        pipeline
            .add_item(Item {
                name: "a".into(),
                processor: callable("mark"),
                arguments: ValueMap::new(),
                forward_to: vec![ForwardEntry {
                    forward_to: "b".into(),
                    name: "x".into(),
                }],
            })
            .unwrap();
        let mut b_args = ValueMap::new();
        b_args.insert("x", Value::Int(1));
        pipeline
            .add_item(Item {
                name: "b".into(),
                processor: callable("echo"),
                arguments: b_args,
                forward_to: vec![],
            })
            .unwrap();

        let err = pipeline.run(&noop_registry()).unwrap_err();
        assert!(matches!(err, EvalError::PipelineArgumentExists { .. }));
    }
}
