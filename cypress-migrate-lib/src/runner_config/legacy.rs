// The configuration as it existed before version 10, read from `cypress.json`.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SupportFile;

fn default_integration_folder() -> String {
    "cypress/integration".to_owned()
}

fn default_support_file() -> SupportFile {
    SupportFile::Path("cypress/support/index.js".to_owned())
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyConfig {
    #[serde(default = "default_integration_folder")]
    pub integration_folder: String,

    #[serde(default = "default_support_file")]
    pub support_file: SupportFile,

    /// Every other key, carried over untouched.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            integration_folder: default_integration_folder(),
            support_file: default_support_file(),
            other: Map::new(),
        }
    }
}

impl LegacyConfig {
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }
}
