use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use cypress_migrate_lib::MigrationConfig;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct InvalidConfigError {
    error: String,
    source: PathBuf,
    range: Option<ErrorRange>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ErrorRange {
    start: usize,
    end: usize,
}

impl InvalidConfigError {
    pub fn rich_output(&self) -> String {
        match &self.range {
            Some(range) => format!(
                "{} (bytes {}..{}): {}",
                self.source.display(),
                range.start,
                range.end,
                self.error
            ),
            None => format!("{}: {}", self.source.display(), self.error),
        }
    }
}

impl From<std::ops::Range<usize>> for ErrorRange {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

// From the start of a top level key to the end of its value.
fn key_range(config_contents: &str, key: &str) -> Option<ErrorRange> {
    let spanned_config = toml::from_str::<
        HashMap<toml::Spanned<String>, toml::Spanned<toml::Value>>,
    >(config_contents)
    .ok()?;

    spanned_config
        .get_key_value(key)
        .map(|(key, value)| ErrorRange {
            start: key.span().start,
            end: value.span().end,
        })
}

pub fn validate_config(
    config_path: &Path,
    config_contents: &str,
) -> Result<MigrationConfig, InvalidConfigError> {
    let config_path_absolute = match config_path.canonicalize() {
        Ok(path) => path,
        Err(_) => config_path.to_path_buf(),
    };

    let config = match MigrationConfig::from_toml(config_contents) {
        Ok(config) => config,
        Err(error) => {
            return Err(InvalidConfigError {
                error: error.message().to_owned(),
                source: config_path.to_path_buf(),
                range: error.span().map(Into::into),
            });
        }
    };

    if config.executor.trim().is_empty() {
        return Err(InvalidConfigError {
            error: "executor can't be empty".to_owned(),
            source: config_path_absolute,
            range: key_range(config_contents, "executor"),
        });
    }

    if let Err(error) = config.check_paths() {
        return Err(InvalidConfigError {
            error: error.to_string(),
            source: config_path_absolute,
            range: key_range(config_contents, error.key),
        });
    }

    if let Err(error) = config.exclude_set() {
        return Err(InvalidConfigError {
            error: error.to_string(),
            source: config_path_absolute,
            range: key_range(config_contents, "exclude"),
        });
    }

    Ok(config)
}
