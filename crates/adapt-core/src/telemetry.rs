// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tracing subscriber initialization.
//!
//! # Environment Variables
//!
//! - `ADAPT_LOG`: `tracing_subscriber::EnvFilter` directive (default: "info")

use tracing_subscriber::layer::SubscriberExt;

/// Initialize the global tracing subscriber: a single fmt layer writing to
/// stderr, filtered by `directive` (typically [`crate::config::Config::log_filter`]).
///
/// Panics if a global subscriber is already set — callers should invoke this
/// once, from `main`.
pub fn init(directive: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(directive)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true);

    let subscriber = tracing_subscriber::Registry::default().with(fmt).with(filter);

    tracing::subscriber::set_global_default(subscriber).expect("failed to set global subscriber");
}

#[cfg(test)]
mod tests {
    #[test]
    fn accepts_a_bare_level_directive() {
        let filter = tracing_subscriber::EnvFilter::try_new("debug");
        assert!(filter.is_ok());
    }
}
