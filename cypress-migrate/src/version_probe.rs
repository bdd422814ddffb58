use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
};

use cypress_migrate_lib::{
    logs::{self, LogMessage},
    version::{major_version, VersionProbe},
};
use serde::Deserialize;

#[derive(Debug)]
pub enum ProbeError {
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    Json {
        source: serde_json::Error,
        path: PathBuf,
    },

    InvalidVersion {
        version: String,
        path: PathBuf,
    },
}

impl Display for ProbeError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::Io { source, path } => {
                write!(
                    formatter,
                    "failed to read file `{}`: {source}",
                    path.display(),
                )
            }

            ProbeError::Json { source, path } => {
                write!(
                    formatter,
                    "failed to parse json file `{}`: {source}",
                    path.display(),
                )
            }

            ProbeError::InvalidVersion { version, path } => {
                write!(
                    formatter,
                    "`{version}` in `{}` is not a version",
                    path.display(),
                )
            }
        }
    }
}

impl std::error::Error for ProbeError {}

#[derive(Deserialize)]
struct PackageJson {
    #[serde(default)]
    version: String,
}

/// Reads the version of cypress installed in the workspace's `node_modules`.
pub struct NodeModulesProbe {
    package_json: PathBuf,
}

impl NodeModulesProbe {
    pub fn new(workspace_root: &Path) -> Self {
        Self {
            package_json: workspace_root
                .join("node_modules")
                .join("cypress")
                .join("package.json"),
        }
    }

    pub fn read_version(&self) -> Result<u32, ProbeError> {
        let contents = fs::read_to_string(&self.package_json).map_err(|source| ProbeError::Io {
            source,
            path: self.package_json.clone(),
        })?;

        let package: PackageJson =
            serde_json::from_str(&contents).map_err(|source| ProbeError::Json {
                source,
                path: self.package_json.clone(),
            })?;

        major_version(&package.version).ok_or_else(|| ProbeError::InvalidVersion {
            version: package.version.clone(),
            path: self.package_json.clone(),
        })
    }

    fn unreadable(&self, error: &ProbeError) -> LogMessage {
        LogMessage::UnreadableCypressVersion {
            path: self.package_json.clone(),
            error: error.to_string(),
        }
    }
}

impl VersionProbe for NodeModulesProbe {
    fn installed_version(&self) -> Option<u32> {
        match self.read_version() {
            Ok(version) => Some(version),
            Err(error) => {
                logs::log(self.unreadable(&error));
                None
            }
        }
    }
}
