// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Reads a config document off disk and lifts it into a [`ConfigNode`].
//!
//! Kept separate from [`crate::locate`] because callers that already hold a
//! resolved path (e.g. one found by some other means than the locator)
//! still need this step.

use std::path::Path;

use adapt_dsl::ConfigNode;

use crate::error::{EvalError, Result};

pub fn load(path: &Path) -> Result<ConfigNode> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| EvalError::Other(format!("reading {}: {e}", path.display())))?;
    Ok(adapt_dsl::parse_document(&text)?)
}
