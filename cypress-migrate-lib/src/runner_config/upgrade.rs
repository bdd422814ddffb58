use super::{E2eConfig, LegacyConfig, ModernConfig, SupportFile};
use crate::planner::SOURCE_EXTENSIONS;

// Keys that only mean something for end-to-end testing, and so move under `e2e`.
const E2E_KEYS: &[&str] = &[
    "baseUrl",
    "ignoreTestFiles",
    "pluginsFile",
    "slowTestThreshold",
    "testFiles",
];

/// Where the upgraded project keeps its files, relative to the project root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModernLayout {
    pub integration_folder: String,
    pub support_file: SupportFile,

    /// Set when fixtures were relocated out of the integration folder.
    pub fixtures_folder: Option<String>,
}

impl ModernLayout {
    /// `src/integration` becomes `src/e2e`.
    pub fn default_integration_folder(legacy_integration_folder: &str) -> String {
        match legacy_integration_folder.trim_end_matches('/').rsplit_once('/') {
            Some((parent, _)) => format!("{parent}/e2e"),
            None => "e2e".to_owned(),
        }
    }

    pub fn default_support_file(integration_folder: &str, extension: &str) -> String {
        format!("{}/e2e.{extension}", integration_folder.trim_end_matches('/'))
    }
}

impl LegacyConfig {
    pub fn upgrade(self, layout: ModernLayout) -> ModernConfig {
        let mut global = self.other;
        let mut e2e_other = serde_json::Map::new();

        for key in E2E_KEYS {
            if let Some(value) = global.remove(*key) {
                e2e_other.insert((*key).to_owned(), value);
            }
        }

        if let Some(fixtures_folder) = layout.fixtures_folder {
            global.insert(
                "fixturesFolder".to_owned(),
                serde_json::Value::String(fixtures_folder),
            );
        }

        // Covers every extension the planner renames specs with.
        let spec_pattern = format!(
            "{}/**/*.cy.{{{}}}",
            layout.integration_folder.trim_end_matches('/'),
            SOURCE_EXTENSIONS.join(",")
        );

        ModernConfig {
            global,
            e2e: E2eConfig {
                integration_folder: layout.integration_folder,
                support_file: layout.support_file,
                spec_pattern,
                other: e2e_other,
            },
        }
    }
}
