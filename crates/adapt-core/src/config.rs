// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::path::PathBuf;

/// Adapt runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory [`crate::locate::locate`] resolves config references
    /// against.
    pub configs_dir: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive for [`crate::telemetry::init`].
    pub log_filter: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `ADAPT_CONFIGS`: base directory configuration files are resolved under
    ///
    /// Optional (with defaults):
    /// - `ADAPT_LOG`: `tracing_subscriber::EnvFilter` directive (default: `info`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let configs_dir = std::env::var("ADAPT_CONFIGS")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::Missing("ADAPT_CONFIGS"))?;

        let log_filter = std::env::var("ADAPT_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self { configs_dir, log_filter })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
