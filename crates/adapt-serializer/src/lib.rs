// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Compiles a field-transformer schema into a streaming record serializer.
//!
//! Distinct from [`adapt_core`]'s config Evaluator: the serializer has its
//! own field-transformer dispatch (`date`, `enum`, `case`, ...) and its own
//! compile step, sharing only the underlying [`adapt_dsl::Value`] domain.

pub mod error;
pub mod predicate;
pub mod runtime;
pub mod schema;
pub mod transformer;
pub mod value_literal;

pub use error::{Result, SerializeError};
pub use predicate::{Operator, Predicate};
pub use runtime::{serialize_one, serialize_records};
pub use schema::{Field, FieldBody, SerializerSchema};
pub use transformer::{Transformer, compile_ignore, compile_transformer};
