// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Thin wrapper over the Evaluator: builds a method call's arguments,
//! invokes it against an already-constructed client, and — when the config
//! names one — routes the raw response through a `post_processor` node
//! before returning (spec §2, "Authorization/Service/Dispatcher").
//!
//! Embedders reach for this from a registered [`crate::callable_registry`]
//! function that wraps a connector's "make a request" method, the same way
//! `from_authorizer` dispatches against the authorization instance.

use adapt_dsl::{ConfigNode, Value, ValueMap};

use crate::error::{EvalError, Result};
use crate::evaluator::{Evaluator, unwrap_identity};
use crate::store::Store;

pub struct Dispatcher;

impl Dispatcher {
    /// `client` must be a `Value` produced by `instance`/`initializer`
    /// evaluation — tagged with its `(module, class)` identity — so the
    /// method call is dispatched against the same native object.
    pub fn receive(client: &Value, config: &ConfigNode, evaluator: &Evaluator<'_>, store: &mut Store) -> Result<Value> {
        let mapping = config
            .as_mapping()
            .ok_or_else(|| EvalError::InvalidArguments { handler: "dispatcher", reason: "config must be a mapping".to_string() })?;
        let method = mapping
            .get("method")
            .and_then(ConfigNode::as_str)
            .ok_or_else(|| EvalError::InvalidArguments { handler: "dispatcher", reason: "config missing `method`".to_string() })?;
        let arguments_node = mapping
            .get("arguments")
            .ok_or_else(|| EvalError::InvalidArguments { handler: "dispatcher", reason: "config missing `arguments`".to_string() })?;
        let arguments = evaluator.evaluate(arguments_node, store)?;

        let (module, class, identity_value) = unwrap_identity(client)
            .ok_or_else(|| EvalError::InvalidArguments { handler: "dispatcher", reason: "`client` is not a tagged instance".to_string() })?;

        let mut call_arg = ValueMap::new();
        call_arg.insert("self", identity_value.clone());
        call_arg.insert("arguments", arguments);
        let response = evaluator.callables().call(module, class, method, Value::Map(call_arg))?;

        match mapping.get("post_processor") {
            Some(post_processor) => {
                store.add("POST_PROCESSOR_RESPONSE", response);
                evaluator.evaluate(post_processor, store)
            }
            None => Ok(response),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable_registry::CallableRegistry;
    use crate::evaluator::wrap_identity;
    use adapt_dsl::parse_document;

    fn make_client() -> Value {
        wrap_identity("facebook_ads", "CampaignApi", Value::string("native-handle"))
    }

    #[test]
    fn receive_invokes_the_registered_method() {
        let mut registry = CallableRegistry::new();
        registry.register("facebook_ads", "CampaignApi", "list_campaigns", |arg| {
            let map = arg.as_map().unwrap();
            let arguments = map.get("arguments").unwrap().as_map().unwrap();
            Ok(Value::string(format!("campaigns-for-{}", arguments.get("account_id").unwrap().as_str().unwrap())))
        });
        let evaluator = Evaluator::new(&registry);
        let mut store = Store::new();
        let config = parse_document(
            "method: list_campaigns\narguments:\n  type: dict\n  items:\n    account_id:\n      type: constant\n      value: acct-1\n",
        )
        .unwrap();

        let result = Dispatcher::receive(&make_client(), &config, &evaluator, &mut store).unwrap();
        assert_eq!(result, Value::string("campaigns-for-acct-1"));
    }

    #[test]
    fn receive_routes_through_post_processor_when_present() {
        let mut registry = CallableRegistry::new();
        registry.register("facebook_ads", "CampaignApi", "list_campaigns", |_| Ok(Value::string("raw-response")));
        let evaluator = Evaluator::new(&registry);
        let mut store = Store::new();
        let config = parse_document(
            "method: list_campaigns\narguments:\n  type: dict\n  items: {}\npost_processor:\n  type: external_input\n  key: POST_PROCESSOR_RESPONSE\n  required: true\n",
        )
        .unwrap();

        let result = Dispatcher::receive(&make_client(), &config, &evaluator, &mut store).unwrap();
        assert_eq!(result, Value::string("raw-response"));
        assert_eq!(store.get("POST_PROCESSOR_RESPONSE", true, Value::Null), Value::string("raw-response"));
    }

    #[test]
    fn receive_rejects_an_untagged_client() {
        let registry = CallableRegistry::new();
        let evaluator = Evaluator::new(&registry);
        let mut store = Store::new();
        let config = parse_document("method: list_campaigns\narguments:\n  type: dict\n  items: {}\n").unwrap();

        let err = Dispatcher::receive(&Value::string("plain-client"), &config, &evaluator, &mut store).unwrap_err();
        assert!(matches!(err, EvalError::InvalidArguments { .. }));
    }
}
