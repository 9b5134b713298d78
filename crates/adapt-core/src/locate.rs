// Copyright (C) 2025 Adapt ETL contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Resolves `module`/`namespace`/`name` references to on-disk config files.
//!
//! The base directory is configurable via the `ADAPT_CONFIGS` environment
//! variable (see [`crate::config::Config`]); callers that already hold a
//! loaded `Config` should pass its `configs_dir` in rather than re-reading
//! the environment.

use std::path::{Path, PathBuf};

use crate::error::EvalError;

/// Layout is `{base_dir}/{module}/{namespace}/{name}.yaml`. Falls back to a
/// `.yml` extension before giving up, since both are common in the wild.
pub fn locate(base_dir: &Path, module: &str, namespace: &str, name: &str) -> Result<PathBuf, EvalError> {
    let dir = base_dir.join(module).join(namespace);
    for ext in ["yaml", "yml"] {
        let candidate = dir.join(format!("{name}.{ext}"));
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(EvalError::ConfigNotFound(format!(
        "{module}/{namespace}/{name} under {}",
        base_dir.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn locates_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("campaigns").join("prod");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("ingest.yaml"), "type: constant\nvalue: 1\n").unwrap();

        let found = locate(dir.path(), "campaigns", "prod", "ingest").unwrap();
        assert_eq!(found, target.join("ingest.yaml"));
    }

    #[test]
    fn falls_back_to_yml_extension() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("campaigns").join("prod");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("ingest.yml"), "type: constant\nvalue: 1\n").unwrap();

        let found = locate(dir.path(), "campaigns", "prod", "ingest").unwrap();
        assert_eq!(found, target.join("ingest.yml"));
    }

    #[test]
    fn missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate(dir.path(), "campaigns", "prod", "missing").unwrap_err();
        assert!(matches!(err, EvalError::ConfigNotFound(_)));
    }
}
