// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The ambient key/value scratchpad threaded through evaluation.
//!
//! Deliberately untyped — it carries heterogeneous values (CLI strings,
//! constructed auth clients, raw lists). The poison-pill return discipline
//! on `get` replaces exceptions so handlers can make context-dependent
//! decisions about a missing key rather than always failing.

use std::collections::HashMap;

use adapt_dsl::Value;

/// Constructed per top-level evaluation, discarded when it completes.
#[derive(Debug, Default)]
pub struct Store {
    data: HashMap<String, Value>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dict(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        let mut store = Store::new();
        store.extend(entries);
        store
    }

    /// Insert or overwrite. Never errors on a duplicate key.
    pub fn add(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = (String, Value)>) {
        for (k, v) in entries {
            self.add(k, v);
        }
    }

    /// If the key is present, return its value. If absent and `required`,
    /// return `poison_pill` for the caller to act on. If absent and not
    /// required, return `Value::Null`. Never errors on a missing key by
    /// itself.
    pub fn get(&self, key: &str, required: bool, poison_pill: Value) -> Value {
        match self.data.get(key) {
            Some(v) => v.clone(),
            None if required => poison_pill,
            None => Value::Null,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
