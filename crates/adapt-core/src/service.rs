// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Thin wrapper over the Evaluator: a Service config names the authorization
//! config it depends on (`{authorization: {namespace, config_name}, client}`,
//! spec §6). Resolving it means locating and evaluating that authorization
//! config, stashing the result under the Store's `"authorization"` key so a
//! `from_authorizer` node downstream can see it, then evaluating `client`.

use std::path::Path;

use adapt_dsl::{ConfigNode, Value};

use crate::authorization::Authorization;
use crate::doc::load;
use crate::error::{EvalError, Result};
use crate::evaluator::Evaluator;
use crate::locate::locate;
use crate::store::Store;

pub struct Service;

impl Service {
    pub fn initialize(
        config: &ConfigNode,
        evaluator: &Evaluator<'_>,
        store: &mut Store,
        configs_dir: &Path,
    ) -> Result<Value> {
        let mapping = config
            .as_mapping()
            .ok_or_else(|| EvalError::InvalidArguments { handler: "service", reason: "config must be a mapping".to_string() })?;

        let auth_cfg = mapping
            .get("authorization")
            .and_then(ConfigNode::as_mapping)
            .ok_or_else(|| EvalError::InvalidArguments { handler: "service", reason: "config missing `authorization`".to_string() })?;
        let namespace = auth_cfg
            .get("namespace")
            .and_then(ConfigNode::as_str)
            .ok_or_else(|| EvalError::InvalidArguments { handler: "service", reason: "`authorization.namespace` missing".to_string() })?;
        let config_name = auth_cfg
            .get("config_name")
            .and_then(ConfigNode::as_str)
            .ok_or_else(|| EvalError::InvalidArguments { handler: "service", reason: "`authorization.config_name` missing".to_string() })?;

        let auth_path = locate(configs_dir, "authorization", namespace, config_name)?;
        let authorization = Authorization::from_config_path(&auth_path, evaluator, store)?;
        store.add("authorization", authorization);

        let client = mapping
            .get("client")
            .ok_or_else(|| EvalError::InvalidArguments { handler: "service", reason: "config missing `client`".to_string() })?;
        evaluator.evaluate(client, store)
    }

    /// Load a YAML Service config from disk and initialize it.
    pub fn from_config_path(
        path: &Path,
        evaluator: &Evaluator<'_>,
        store: &mut Store,
        configs_dir: &Path,
    ) -> Result<Value> {
        let config = load(path)?;
        Self::initialize(&config, evaluator, store, configs_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable_registry::CallableRegistry;
    use adapt_dsl::parse_document;
    use std::fs;

    #[test]
    fn initialize_resolves_authorization_then_evaluates_client() {
        let dir = tempfile::tempdir().unwrap();
        let auth_dir = dir.path().join("authorization").join("facebook");
        fs::create_dir_all(&auth_dir).unwrap();
        fs::write(auth_dir.join("prod.yaml"), "initializer:\n  type: constant\n  value: token-abc\n").unwrap();

        let service_node = parse_document(
            "authorization:\n  namespace: facebook\n  config_name: prod\nclient:\n  type: constant\n  value: a-client\n",
        )
        .unwrap();

        let registry = CallableRegistry::new();
        let evaluator = Evaluator::new(&registry);
        let mut store = Store::new();
        let client = Service::initialize(&service_node, &evaluator, &mut store, dir.path()).unwrap();

        assert_eq!(client, Value::string("a-client"));
        assert_eq!(store.get("authorization", true, Value::Null), Value::string("token-abc"));
    }

    #[test]
    fn missing_authorization_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let service_node = parse_document(
            "authorization:\n  namespace: facebook\n  config_name: missing\nclient:\n  type: constant\n  value: a-client\n",
        )
        .unwrap();
        let registry = CallableRegistry::new();
        let evaluator = Evaluator::new(&registry);
        let mut store = Store::new();
        let err = Service::initialize(&service_node, &evaluator, &mut store, dir.path()).unwrap_err();
        assert!(matches!(err, EvalError::ConfigNotFound(_)));
    }
}
