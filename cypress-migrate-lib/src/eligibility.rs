use std::fmt;

use serde::Serialize;

use crate::{
    project::ProjectConfiguration, runner_config::MODERN_CONFIG_FILE_NAMES, tree::FileTree,
    version::VersionProbe,
};

/// The oldest installed runner the migration knows how to upgrade from.
pub const MINIMUM_SUPPORTED_VERSION: u32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum IneligibleReason {
    AlreadyModernConfigPresent,
    WrongExecutor,
    UnsupportedInstalledVersion,
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IneligibleReason::AlreadyModernConfigPresent => write!(
                formatter,
                "a cypress.config file already exists. if cypress.json is still present, \
                the project needs to be finished by hand"
            ),

            IneligibleReason::WrongExecutor => {
                write!(formatter, "the target doesn't use the cypress executor")
            }

            IneligibleReason::UnsupportedInstalledVersion => write!(
                formatter,
                "cypress v{MINIMUM_SUPPORTED_VERSION} or newer must be installed to migrate"
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResult {
    should_upgrade: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<IneligibleReason>,
}

impl EligibilityResult {
    pub fn upgrade() -> Self {
        Self {
            should_upgrade: true,
            reason: None,
        }
    }

    pub fn decline(reason: IneligibleReason) -> Self {
        Self {
            should_upgrade: false,
            reason: Some(reason),
        }
    }

    pub fn should_upgrade(&self) -> bool {
        self.should_upgrade
    }

    pub fn reason(&self) -> Option<IneligibleReason> {
        self.reason
    }
}

/// Decides whether a project's target can be migrated. Structural problems are reported
/// before the installed version, since they are usually the more actionable ones.
pub fn check(
    tree: &dyn FileTree,
    project: &ProjectConfiguration,
    target_name: &str,
    expected_executor: &str,
    probe: &dyn VersionProbe,
) -> EligibilityResult {
    let has_modern_config = MODERN_CONFIG_FILE_NAMES
        .iter()
        .any(|file_name| tree.is_file(&project.root().join(file_name)));

    if has_modern_config {
        return EligibilityResult::decline(IneligibleReason::AlreadyModernConfigPresent);
    }

    let executor = project
        .targets
        .get(target_name)
        .and_then(|target| target.executor.as_deref());

    if executor != Some(expected_executor) {
        return EligibilityResult::decline(IneligibleReason::WrongExecutor);
    }

    match probe.installed_version() {
        Some(version) if version >= MINIMUM_SUPPORTED_VERSION => EligibilityResult::upgrade(),
        _ => EligibilityResult::decline(IneligibleReason::UnsupportedInstalledVersion),
    }
}
