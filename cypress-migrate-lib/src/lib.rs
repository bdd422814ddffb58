//! Upgrades Cypress projects in an Nx workspace from the `cypress.json` layout to
//! `cypress.config.*`, moving specs, fixtures and the support file on the way.

pub mod config;
pub mod eligibility;
pub mod imports;
pub mod logs;
pub mod migration;
pub mod paths;
pub mod planner;
pub mod project;
pub mod runner_config;
pub mod scaffold;
pub mod text;
pub mod tree;
pub mod version;

#[cfg(test)]
mod test_util;

pub use config::{MigrationConfig, UnrecognizedSpecs};
pub use eligibility::{EligibilityResult, IneligibleReason};
pub use migration::{
    MigrationError, MigrationOutcome, MigrationPlan, MigrationReport, Migrator,
};
pub use planner::{PathMapping, PlannedMove, PlanningError};
pub use tree::{DiskTree, FileTree, MemoryTree};
pub use version::VersionProbe;
