//! The two shapes of the runner's configuration file, and the upgrade between them.

mod legacy;
mod modern;
mod upgrade;

pub use legacy::LegacyConfig;
pub use modern::{ConfigLanguage, E2eConfig, ModernConfig};
pub use upgrade::ModernLayout;

use std::path::Path;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::tree::FileTree;

pub const LEGACY_CONFIG_FILE_NAME: &str = "cypress.json";

pub const MODERN_CONFIG_FILE_NAMES: &[&str] = &[
    "cypress.config.ts",
    "cypress.config.js",
    "cypress.config.mjs",
    "cypress.config.cjs",
];

/// `supportFile` is either a path relative to the project root, or `false`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SupportFile {
    Path(String),
    Disabled,
}

impl SupportFile {
    pub fn path(&self) -> Option<&str> {
        match self {
            SupportFile::Path(path) => Some(path),
            SupportFile::Disabled => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SupportFileSerde {
    Path(String),
    Enabled(bool),
}

impl<'de> Deserialize<'de> for SupportFile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match SupportFileSerde::deserialize(deserializer)? {
            SupportFileSerde::Path(path) => Ok(SupportFile::Path(path)),
            SupportFileSerde::Enabled(false) => Ok(SupportFile::Disabled),
            SupportFileSerde::Enabled(true) => Err(de::Error::custom(
                "supportFile must be a path or `false`",
            )),
        }
    }
}

impl Serialize for SupportFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SupportFile::Path(path) => serializer.serialize_str(path),
            SupportFile::Disabled => serializer.serialize_bool(false),
        }
    }
}

/// TypeScript when the support file is TypeScript or the project has a `tsconfig.json`.
pub fn project_language(
    tree: &dyn FileTree,
    project_root: &Path,
    support_file: Option<&Path>,
) -> ConfigLanguage {
    let typescript_support = support_file
        .and_then(|support_file| support_file.extension())
        .map_or(false, |extension| extension == "ts" || extension == "tsx");

    if typescript_support || tree.is_file(&project_root.join("tsconfig.json")) {
        ConfigLanguage::TypeScript
    } else {
        ConfigLanguage::JavaScript
    }
}
