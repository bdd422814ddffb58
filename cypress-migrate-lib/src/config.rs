use std::{
    fmt,
    path::{Component, Path},
};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "cypress-migrate.toml";
pub const DEFAULT_EXECUTOR: &str = "@nrwl/cypress:cypress";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
#[serde(rename_all = "kebab-case")]
pub struct MigrationConfig {
    /// The executor a target must use to be migrated.
    pub executor: String,

    /// Overrides the new integration folder, relative to the project root.
    pub integration_folder: Option<String>,

    /// Overrides the new support file, relative to the project root.
    pub support_file: Option<String>,

    pub unrecognized_specs: UnrecognizedSpecs,

    /// Globs, relative to the project root, of files that are moved but never rewritten.
    pub exclude: Vec<String>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        MigrationConfig {
            executor: DEFAULT_EXECUTOR.to_owned(),
            integration_folder: None,
            support_file: None,
            unrecognized_specs: UnrecognizedSpecs::default(),
            exclude: Vec::new(),
        }
    }
}

impl MigrationConfig {
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn exclude_set(&self) -> Result<GlobSet, globset::Error> {
        let mut builder = GlobSetBuilder::new();

        for pattern in &self.exclude {
            builder.add(Glob::new(pattern)?);
        }

        builder.build()
    }

    /// Checks that the path overrides stay inside the project they're joined onto.
    pub fn check_paths(&self) -> Result<(), OutsideProjectError> {
        for (key, value) in [
            ("integration-folder", &self.integration_folder),
            ("support-file", &self.support_file),
        ] {
            if let Some(path) = value {
                if !is_project_relative(path) {
                    return Err(OutsideProjectError {
                        key,
                        path: path.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Relative, and never climbing out with `..`.
pub fn is_project_relative(path: &str) -> bool {
    let path = Path::new(path);

    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutsideProjectError {
    /// The config key, as written in `cypress-migrate.toml`.
    pub key: &'static str,
    pub path: String,
}

impl fmt::Display for OutsideProjectError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "{} must be a path inside the project, got `{}`",
            self.key, self.path
        )
    }
}

impl std::error::Error for OutsideProjectError {}

/// What to do with a `*.spec.<ext>` file whose extension isn't a known source extension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnrecognizedSpecs {
    /// Move it into the new integration folder without renaming it.
    #[default]
    Move,
    /// Refuse to migrate the project.
    Deny,
}
