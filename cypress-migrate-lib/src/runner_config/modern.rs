use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SupportFile;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ModernConfig {
    #[serde(flatten)]
    pub global: Map<String, Value>,

    pub e2e: E2eConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct E2eConfig {
    pub integration_folder: String,
    pub support_file: SupportFile,
    pub spec_pattern: String,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigLanguage {
    JavaScript,
    TypeScript,
}

impl ConfigLanguage {
    pub fn file_name(self) -> &'static str {
        match self {
            ConfigLanguage::JavaScript => "cypress.config.js",
            ConfigLanguage::TypeScript => "cypress.config.ts",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ConfigLanguage::JavaScript => "js",
            ConfigLanguage::TypeScript => "ts",
        }
    }
}

impl ModernConfig {
    /// Renders the config file, with the configuration object passed to `defineConfig`.
    pub fn to_source(&self, language: ConfigLanguage) -> Result<String, serde_json::Error> {
        let object = serde_json::to_string_pretty(self)?;

        Ok(match language {
            ConfigLanguage::TypeScript => format!(
                "import {{ defineConfig }} from 'cypress';\n\nexport default defineConfig({object});\n"
            ),
            ConfigLanguage::JavaScript => format!(
                "const {{ defineConfig }} = require('cypress');\n\nmodule.exports = defineConfig({object});\n"
            ),
        })
    }
}
