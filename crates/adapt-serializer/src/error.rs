// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Errors raised compiling or running a serializer schema.

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// A transformer or sub-schema `type` tag has no registered handler.
    #[error("unknown type tag: {0}")]
    UnknownType(String),

    /// Two fields at the same schema level (inline/derived/constants,
    /// including spread keys from array/extended_array sub-schemas) share a
    /// name.
    #[error("duplicate field `{0}` in serializer schema")]
    DuplicateField(String),

    /// `enum` transformer met an unmapped value with no `on_error`.
    #[error("value {0:?} has no enum mapping and no on_error fallback")]
    EnumMiss(String),

    /// Formatter-adjacent `format_as`/date-format string outside what the
    /// transformer understands.
    #[error("invalid format: {0}")]
    InvalidFormatTag(String),

    /// A `when` clause had zero or more than one recognized operator key.
    #[error("ambiguous predicate operator in `when` clause: {0}")]
    PredicateOperatorAmbiguous(String),

    /// A schema node (field entry, `when` clause, sub-schema) was malformed.
    #[error("invalid schema at `{where_}`: {reason}")]
    InvalidSchema { where_: String, reason: String },

    #[error(transparent)]
    Parse(#[from] adapt_dsl::ParseError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerializeError>;
