// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Thin wrapper over the Evaluator: an authorization config is nothing more
//! than `{initializer}` (spec §6) — evaluating that one node produces the
//! tagged instance a `from_authorizer` node or a [`crate::service::Service`]
//! later dispatches against.

use std::path::Path;

use adapt_dsl::{ConfigNode, Value};

use crate::doc::load;
use crate::error::{EvalError, Result};
use crate::evaluator::Evaluator;
use crate::store::Store;

pub struct Authorization;

impl Authorization {
    /// Evaluate an already-parsed authorization config's `initializer` node.
    pub fn initialize(config: &ConfigNode, evaluator: &Evaluator<'_>, store: &mut Store) -> Result<Value> {
        let mapping = config
            .as_mapping()
            .ok_or_else(|| EvalError::InvalidArguments { handler: "authorization", reason: "config must be a mapping".to_string() })?;
        let initializer = mapping
            .get("initializer")
            .ok_or_else(|| EvalError::InvalidArguments { handler: "authorization", reason: "config missing `initializer`".to_string() })?;
        evaluator.evaluate(initializer, store)
    }

    /// Load a YAML authorization config from disk and evaluate it.
    pub fn from_config_path(path: &Path, evaluator: &Evaluator<'_>, store: &mut Store) -> Result<Value> {
        let config = load(path)?;
        Self::initialize(&config, evaluator, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable_registry::CallableRegistry;
    use adapt_dsl::parse_document;

    #[test]
    fn initialize_evaluates_the_initializer_node() {
        let node = parse_document("initializer:\n  type: constant\n  value: token-123\n").unwrap();
        let registry = CallableRegistry::new();
        let evaluator = Evaluator::new(&registry);
        let mut store = Store::new();
        let result = Authorization::initialize(&node, &evaluator, &mut store).unwrap();
        assert_eq!(result, Value::string("token-123"));
    }

    #[test]
    fn missing_initializer_is_an_error() {
        let node = parse_document("other: 1\n").unwrap();
        let registry = CallableRegistry::new();
        let evaluator = Evaluator::new(&registry);
        let mut store = Store::new();
        assert!(Authorization::initialize(&node, &evaluator, &mut store).is_err());
    }
}
