// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Crate-wide error type for the Evaluator, Store, Formatter, config locator,
//! and Pipeline executor. Policy is fail-fast with no local recovery — every
//! variant here surfaces to the outer driver unchanged (spec §7).

/// Errors raised while evaluating a configuration tree or running a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// A typed node's `type` tag has no registered handler.
    #[error("unknown type tag: {0}")]
    UnknownType(String),

    /// `external_input` was marked `required` and the key was absent from
    /// the store.
    #[error("missing required input: {0}")]
    MissingInput(String),

    /// `callable` referenced a `(module, class, method)` triple with no
    /// registered implementation.
    #[error("unknown callable: {module}.{class}.{method}")]
    UnknownCallable {
        module: String,
        class: String,
        method: String,
    },

    /// `format_as` named a tag outside the closed renderer set.
    #[error("invalid format tag: {0}")]
    InvalidFormatTag(String),

    /// The config locator could not find `module/namespace/name` under the
    /// configured base directory.
    #[error("config not found: {0}")]
    ConfigNotFound(String),

    /// A `Pipeline` step name was inserted twice.
    #[error("pipeline step name already exists: {0}")]
    PipelineNameExists(String),

    /// A `forward_to` entry targeted an argument name the downstream step
    /// already has.
    #[error("pipeline step '{item}' already has an argument named '{arg}'")]
    PipelineArgumentExists { item: String, arg: String },

    /// A `Pipeline` step's `forward_to` named a step that does not exist.
    #[error("pipeline forward_to target not found: {0}")]
    PipelineTargetNotFound(String),

    /// A handler received arguments of the wrong shape (e.g. `dict`'s
    /// `items` wasn't a mapping).
    #[error("invalid arguments for `{handler}`: {reason}")]
    InvalidArguments { handler: &'static str, reason: String },

    #[error(transparent)]
    Parse(#[from] adapt_dsl::ParseError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<String> for EvalError {
    fn from(s: String) -> Self {
        EvalError::Other(s)
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
