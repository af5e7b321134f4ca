//! Rule-file loading.
//!
//! Every error names the file it came from. Strings parsed in memory name
//! their origin explicitly.

use crate::config::schema::{RuleSet, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: PathBuf,
        source: toml_edit::de::Error,
    },
    Validation {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    /// The rule file the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Io { path, .. }
            | ConfigError::Toml { path, .. }
            | ConfigError::Validation { path, .. } => path,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read rule file {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => {
                write!(f, "{} is not a valid rule file: {}", path.display(), source)
            }
            ConfigError::Validation { path, source } => {
                // One issue per line, indented under the file name.
                write!(f, "invalid rule file {}:", path.display())?;
                for issue in &source.issues {
                    write!(f, "\n  - {issue}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

/// Parse and validate a rule set. `origin` is used in error messages only.
pub fn load_from_str(input: &str, origin: impl AsRef<Path>) -> Result<RuleSet, ConfigError> {
    let origin = origin.as_ref();
    let rule_set: RuleSet = toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml {
        path: origin.to_path_buf(),
        source,
    })?;
    rule_set
        .validate()
        .map_err(|source| ConfigError::Validation {
            path: origin.to_path_buf(),
            source,
        })?;

    debug!(
        origin = %origin.display(),
        name = %rule_set.meta.name,
        rules = rule_set.rules.len(),
        "rule set loaded"
    );
    Ok(rule_set)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RuleSet, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents, path)
}
