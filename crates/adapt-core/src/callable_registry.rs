// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Embedder-populated table of native functions the `callable`, `instance`,
//! `initializer`, and `from_authorizer` handlers dispatch into.
//!
//! A config tree can only *name* a `(module, class, method)` triple; it has
//! no way to define new behavior, so the set of callables a pipeline can
//! reach is exactly what the embedding application registers here before
//! evaluation starts.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use adapt_dsl::Value;

use crate::error::EvalError;

pub type NativeFn = Arc<dyn Fn(Value) -> Result<Value, EvalError> + Send + Sync>;

#[derive(Clone, Default)]
pub struct CallableRegistry {
    fns: HashMap<(String, String, String), NativeFn>,
}

impl fmt::Debug for CallableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableRegistry")
            .field("len", &self.fns.len())
            .finish()
    }
}

impl CallableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        module: impl Into<String>,
        class: impl Into<String>,
        method: impl Into<String>,
        f: impl Fn(Value) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) {
        self.fns.insert((module.into(), class.into(), method.into()), Arc::new(f));
    }

    pub fn call(&self, module: &str, class: &str, method: &str, arg: Value) -> Result<Value, EvalError> {
        let key = (module.to_string(), class.to_string(), method.to_string());
        match self.fns.get(&key) {
            Some(f) => f(arg),
            None => Err(EvalError::UnknownCallable {
                module: module.to_string(),
                class: class.to_string(),
                method: method.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_callable_dispatches() {
        let mut reg = CallableRegistry::new();
        reg.register("pkg", "Cls", "double", |v| match v {
            Value::Int(n) => Ok(Value::Int(n * 2)),
            other => Ok(other),
        });
        let result = reg.call("pkg", "Cls", "double", Value::Int(21)).unwrap();
        assert_eq!(result, Value::Int(42));
    }

    #[test]
    fn unregistered_triple_is_an_error() {
        let reg = CallableRegistry::new();
        let err = reg.call("pkg", "Cls", "missing", Value::Null).unwrap_err();
        assert!(matches!(err, EvalError::UnknownCallable { .. }));
    }
}
