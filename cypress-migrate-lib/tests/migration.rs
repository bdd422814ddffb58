use std::{
    fs, io,
    path::{Path, PathBuf},
};

use cypress_migrate_lib::{
    migration::FileOperation,
    project::read_project_configuration,
    runner_config::{ModernConfig, SupportFile},
    version::FixedVersion,
    *,
};

const PROJECT_ROOT: &str = "apps/app-e2e";

macro_rules! files {
    {
        $(
            $path:expr => $contents:expr,
        )*
    } => {{
        let mut files: Vec<(&str, &str)> = Vec::new();
        $(
            files.push(($path, $contents));
        )*
        files
    }};
}

fn workspace(tree: &mut dyn FileTree, cypress_json: &str, files: &[(&str, &str)]) {
    tree.write(
        Path::new("workspace.json"),
        br#"{ "version": 2, "projects": { "app-e2e": "apps/app-e2e" } }"#,
    )
    .unwrap();

    tree.write(
        &Path::new(PROJECT_ROOT).join("project.json"),
        br#"{
            "sourceRoot": "apps/app-e2e/src",
            "projectType": "application",
            "targets": {
                "e2e": {
                    "executor": "@nrwl/cypress:cypress",
                    "options": { "cypressConfig": "apps/app-e2e/cypress.json", "devServerTarget": "app:serve" },
                    "configurations": {
                        "production": { "devServerTarget": "app:serve:production" }
                    }
                },
                "lint": { "executor": "@nrwl/linter:eslint" }
            }
        }"#,
    )
    .unwrap();

    tree.write(
        &Path::new(PROJECT_ROOT).join("cypress.json"),
        cypress_json.as_bytes(),
    )
    .unwrap();

    for (path, contents) in files {
        tree.write(&Path::new(PROJECT_ROOT).join(path), contents.as_bytes())
            .unwrap();
    }
}

fn migrator(version: Option<u32>) -> Migrator {
    migrator_with(MigrationConfig::default(), version)
}

fn migrator_with(config: MigrationConfig, version: Option<u32>) -> Migrator {
    Migrator::new(config, Box::new(FixedVersion(version))).unwrap()
}

fn project_path(path: &str) -> PathBuf {
    Path::new(PROJECT_ROOT).join(path)
}

fn read(tree: &dyn FileTree, path: &str) -> String {
    tree.read_to_string(&project_path(path))
        .unwrap_or_else(|error| panic!("couldn't read {path}: {error}"))
}

// The object a generated config passes to `defineConfig`.
fn modern_config(source: &str) -> ModernConfig {
    let start = source
        .find("defineConfig(")
        .expect("no call to defineConfig")
        + "defineConfig(".len();
    let end = source.rfind(')').expect("unterminated defineConfig call");

    serde_json::from_str(&source[start..end]).unwrap()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Failing {
    Rename,
    Delete,
}

/// A memory tree where renaming or deleting one path fails.
struct FailingTree {
    inner: MemoryTree,
    failing: Failing,
    path: PathBuf,
}

impl FailingTree {
    fn check(&self, failing: Failing, path: &Path) -> io::Result<()> {
        if self.failing == failing && self.path == path {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only file"))
        } else {
            Ok(())
        }
    }
}

impl FileTree for FailingTree {
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }

    fn children(&self, directory: &Path) -> io::Result<Vec<PathBuf>> {
        self.inner.children(directory)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.inner.read(path)
    }

    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.inner.write(path, contents)
    }

    fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        self.check(Failing::Rename, from)?;
        self.inner.rename(from, to)
    }

    fn delete(&mut self, path: &Path) -> io::Result<()> {
        self.check(Failing::Delete, path)?;
        self.inner.delete(path)
    }
}

const LEGACY_CONFIG: &str = r#"{
    "fileServerFolder": ".",
    "fixturesFolder": "./src/fixtures",
    "integrationFolder": "src/integration",
    "supportFile": "src/support/index.ts",
    "baseUrl": "http://localhost:4200",
    "video": true
}"#;

fn scenario_files() -> Vec<(&'static str, &'static str)> {
    files! {
        "src/integration/a.spec.ts" => "import { getGreeting } from '../support/app.po';\n\ndescribe('app', () => getGreeting());\n",
        "src/integration/sub/b.spec.ts" => "import * as support from \"../../support\";\nimport { login } from '../../support/app.po';\n",
        "src/support/index.ts" => "import './commands';\n",
        "src/support/commands.ts" => "Cypress.Commands.add('login', () => {});\n",
        "src/support/app.po.ts" => "export const getGreeting = () => cy.get('h1');\n",
        "src/plugins/index.js" => "module.exports = () => {};\n",
    }
}

#[test]
fn migrates_the_default_layout() {
    let mut tree = MemoryTree::new();
    workspace(&mut tree, LEGACY_CONFIG, &scenario_files());

    let report = match migrator(Some(9)).run(&mut tree, "app-e2e", "e2e").unwrap() {
        MigrationOutcome::Done(report) => report,
        MigrationOutcome::Skipped(reason) => panic!("migration was skipped: {reason}"),
    };

    for path in ["src/e2e/a.cy.ts", "src/e2e/sub/b.cy.ts", "src/e2e/e2e.ts"] {
        assert!(tree.is_file(&project_path(path)), "{path} is missing");
    }

    for path in ["src/integration", "src/support/index.ts", "cypress.json"] {
        assert!(!tree.exists(&project_path(path)), "{path} still exists");
    }

    assert_eq!(report.moved_files, 3);
    assert_eq!(report.rewritten_files, 2);
    assert_eq!(report.replacements, 2);
    assert_eq!(report.modern_config, project_path("cypress.config.ts"));

    assert_eq!(
        read(&tree, "src/e2e/sub/b.cy.ts"),
        "import * as support from \"../e2e\";\nimport { login } from '../../support/app.po';\n"
    );
    assert_eq!(read(&tree, "src/e2e/e2e.ts"), "import '../support/commands';\n");
    assert_eq!(
        read(&tree, "src/e2e/a.cy.ts"),
        "import { getGreeting } from '../support/app.po';\n\ndescribe('app', () => getGreeting());\n"
    );

    let modern = modern_config(&read(&tree, "cypress.config.ts"));
    assert_eq!(modern.e2e.integration_folder, "src/e2e");
    assert_eq!(
        modern.e2e.support_file,
        SupportFile::Path("src/e2e/e2e.ts".to_owned())
    );
    assert_eq!(
        modern.e2e.spec_pattern,
        "src/e2e/**/*.cy.{js,jsx,ts,tsx,cjs,mjs}"
    );
    assert_eq!(
        modern.e2e.other.get("baseUrl"),
        Some(&serde_json::json!("http://localhost:4200"))
    );
    assert_eq!(modern.global.get("video"), Some(&serde_json::json!(true)));

    let project = read_project_configuration(&tree, "app-e2e").unwrap();
    assert_eq!(
        project.targets["e2e"].options["cypressConfig"],
        "apps/app-e2e/cypress.config.ts"
    );
    assert_eq!(
        project.targets["e2e"].options["devServerTarget"],
        "app:serve"
    );
    assert!(project.other.contains_key("projectType"));
}

#[test]
fn running_twice_is_declined() {
    let mut tree = MemoryTree::new();
    workspace(&mut tree, LEGACY_CONFIG, &scenario_files());

    let migrator = migrator(Some(10));
    assert!(matches!(
        migrator.run(&mut tree, "app-e2e", "e2e").unwrap(),
        MigrationOutcome::Done(_)
    ));

    let migrated = tree.clone();
    assert_eq!(
        migrator.run(&mut tree, "app-e2e", "e2e").unwrap(),
        MigrationOutcome::Skipped(IneligibleReason::AlreadyModernConfigPresent)
    );
    assert_eq!(tree, migrated);
}

#[test]
fn old_versions_are_left_untouched() {
    let mut tree = MemoryTree::new();
    workspace(&mut tree, LEGACY_CONFIG, &scenario_files());
    let before = tree.clone();

    assert_eq!(
        migrator(Some(7)).run(&mut tree, "app-e2e", "e2e").unwrap(),
        MigrationOutcome::Skipped(IneligibleReason::UnsupportedInstalledVersion)
    );
    assert_eq!(tree, before);
}

#[test]
fn existing_modern_config_wins_over_everything() {
    let mut tree = MemoryTree::new();
    workspace(&mut tree, LEGACY_CONFIG, &scenario_files());
    tree.write(&project_path("cypress.config.ts"), b"export default {};")
        .unwrap();
    let before = tree.clone();

    let config = MigrationConfig {
        executor: "@nrwl/workspace:run-commands".to_owned(),
        ..MigrationConfig::default()
    };

    assert_eq!(
        migrator_with(config, Some(7))
            .run(&mut tree, "app-e2e", "e2e")
            .unwrap(),
        MigrationOutcome::Skipped(IneligibleReason::AlreadyModernConfigPresent)
    );
    assert_eq!(tree, before);
}

#[test]
fn other_targets_are_not_migrated() {
    let mut tree = MemoryTree::new();
    workspace(&mut tree, LEGACY_CONFIG, &scenario_files());

    assert_eq!(
        migrator(Some(9)).run(&mut tree, "app-e2e", "lint").unwrap(),
        MigrationOutcome::Skipped(IneligibleReason::WrongExecutor)
    );
}

#[test]
fn fixtures_move_to_the_source_root() {
    let mut tree = MemoryTree::new();
    let mut files = scenario_files();
    files.push(("src/integration/fixtures/example.json", "{ \"a\": 1 }"));
    files.push((
        "src/integration/c.spec.js",
        "const example = require('./fixtures/example.json');\n",
    ));
    workspace(&mut tree, LEGACY_CONFIG, &files);

    migrator(Some(9)).run(&mut tree, "app-e2e", "e2e").unwrap();

    assert_eq!(read(&tree, "src/fixtures/example.json"), "{ \"a\": 1 }");
    assert!(!tree.exists(&project_path("src/e2e/fixtures")));
    assert_eq!(
        read(&tree, "src/e2e/c.cy.js"),
        "const example = require('../fixtures/example.json');\n"
    );

    let modern = modern_config(&read(&tree, "cypress.config.ts"));
    assert_eq!(
        modern.global.get("fixturesFolder"),
        Some(&serde_json::json!("src/fixtures"))
    );
}

#[test]
fn dry_runs_change_nothing() {
    let mut tree = MemoryTree::new();
    workspace(&mut tree, LEGACY_CONFIG, &scenario_files());
    let before = tree.clone();

    let plan = match migrator(Some(9)).plan(&tree, "app-e2e", "e2e").unwrap() {
        MigrationOutcome::Done(plan) => plan,
        MigrationOutcome::Skipped(reason) => panic!("migration was skipped: {reason}"),
    };

    assert_eq!(plan.mapping.len(), 3);
    assert_eq!(plan.rewrites.len(), 2);
    assert_eq!(plan.modern_config, project_path("cypress.config.ts"));
    assert!(plan.staging_directory.is_none());
    assert_eq!(tree, before);

    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["project"], "app-e2e");
    assert_eq!(json["mapping"]["moves"][0]["kind"], "spec");
}

#[test]
fn javascript_projects_get_a_javascript_config() {
    let mut tree = MemoryTree::new();
    workspace(
        &mut tree,
        "{}",
        &files! {
            "cypress/integration/app.spec.js" => "describe('app', () => {});\n",
            "cypress/support/index.js" => "require('./commands');\n",
            "cypress/support/commands.js" => "",
        },
    );

    migrator(Some(9)).run(&mut tree, "app-e2e", "e2e").unwrap();

    assert!(tree.is_file(&project_path("cypress/e2e/app.cy.js")));
    assert_eq!(
        read(&tree, "cypress/e2e/e2e.js"),
        "require('../support/commands');\n"
    );

    let source = read(&tree, "cypress.config.js");
    assert!(source.starts_with("const { defineConfig } = require('cypress');"));
    assert_eq!(
        modern_config(&source).e2e.integration_folder,
        "cypress/e2e"
    );
}

#[test]
fn disabled_support_files_stay_disabled() {
    let mut tree = MemoryTree::new();
    workspace(
        &mut tree,
        r#"{ "integrationFolder": "src/integration", "supportFile": false }"#,
        &files! {
            "src/integration/a.spec.ts" => "",
        },
    );

    migrator(Some(9)).run(&mut tree, "app-e2e", "e2e").unwrap();

    // Without a support file or a tsconfig.json, nothing says the project uses TypeScript.
    let modern = modern_config(&read(&tree, "cypress.config.js"));
    assert_eq!(modern.e2e.support_file, SupportFile::Disabled);
    assert!(tree.is_file(&project_path("src/e2e/a.cy.ts")));
}

#[test]
fn conflicts_abort_before_anything_changes() {
    let mut tree = MemoryTree::new();
    let mut files = scenario_files();
    files.push(("src/integration/a.cy.ts", ""));
    workspace(&mut tree, LEGACY_CONFIG, &files);
    let before = tree.clone();

    match migrator(Some(9)).run(&mut tree, "app-e2e", "e2e") {
        Err(MigrationError::Planning {
            project,
            source: PlanningError::Conflict { destination, .. },
        }) => {
            assert_eq!(project, "app-e2e");
            assert_eq!(destination, project_path("src/e2e/a.cy.ts"));
        }

        other => panic!("expected a planning conflict, got {other:?}"),
    }

    assert_eq!(tree, before);
}

#[test]
fn unrecognized_specs_can_be_denied() {
    let mut tree = MemoryTree::new();
    let mut files = scenario_files();
    files.push(("src/integration/legacy.spec.coffee", ""));
    workspace(&mut tree, LEGACY_CONFIG, &files);

    let mut moving = tree.clone();
    migrator(Some(9)).run(&mut moving, "app-e2e", "e2e").unwrap();
    assert!(moving.is_file(&project_path("src/e2e/legacy.spec.coffee")));

    let config = MigrationConfig {
        unrecognized_specs: UnrecognizedSpecs::Deny,
        ..MigrationConfig::default()
    };

    assert!(matches!(
        migrator_with(config, Some(9)).run(&mut tree, "app-e2e", "e2e"),
        Err(MigrationError::Planning {
            source: PlanningError::UnrecognizedSpecFile { .. },
            ..
        })
    ));
}

#[test]
fn excluded_files_move_without_rewrites() {
    let mut tree = MemoryTree::new();
    workspace(&mut tree, LEGACY_CONFIG, &scenario_files());

    let config = MigrationConfig {
        exclude: vec!["src/integration/sub/**".to_owned()],
        ..MigrationConfig::default()
    };

    migrator_with(config, Some(9))
        .run(&mut tree, "app-e2e", "e2e")
        .unwrap();

    assert_eq!(
        read(&tree, "src/e2e/sub/b.cy.ts"),
        "import * as support from \"../../support\";\nimport { login } from '../../support/app.po';\n"
    );
}

#[test]
fn overlapping_moves_go_through_staging() {
    let mut tree = MemoryTree::new();
    workspace(
        &mut tree,
        r#"{ "integrationFolder": "src/e2e", "supportFile": "src/support/index.ts" }"#,
        &files! {
            "src/e2e/a.spec.ts" => "a",
            "src/e2e/b.spec.ts" => "b",
            "src/support/index.ts" => "support",
        },
    );

    let config = MigrationConfig {
        integration_folder: Some("src/e2e".to_owned()),
        support_file: Some("src/e2e/a.spec.ts".to_owned()),
        ..MigrationConfig::default()
    };

    let migrator = migrator_with(config, Some(9));

    match migrator.plan(&tree, "app-e2e", "e2e").unwrap() {
        MigrationOutcome::Done(plan) => assert!(plan.staging_directory.is_some()),
        MigrationOutcome::Skipped(reason) => panic!("migration was skipped: {reason}"),
    }

    migrator.run(&mut tree, "app-e2e", "e2e").unwrap();

    assert_eq!(read(&tree, "src/e2e/a.cy.ts"), "a");
    assert_eq!(read(&tree, "src/e2e/b.cy.ts"), "b");
    assert_eq!(read(&tree, "src/e2e/a.spec.ts"), "support");
    assert!(!tree.exists(&project_path(".cypress-migrate-staging")));
}

#[test]
fn unknown_projects_are_errors() {
    let mut tree = MemoryTree::new();

    assert!(matches!(
        migrator(Some(9)).run(&mut tree, "nope", "e2e"),
        Err(MigrationError::Project(_))
    ));
}

#[test]
fn migrates_on_disk() {
    let directory = tempfile::tempdir().unwrap();
    let mut tree = DiskTree::new(directory.path());
    workspace(&mut tree, LEGACY_CONFIG, &scenario_files());

    migrator(Some(9)).run(&mut tree, "app-e2e", "e2e").unwrap();

    let root = directory.path().join(PROJECT_ROOT);
    assert!(root.join("src/e2e/a.cy.ts").is_file());
    assert!(root.join("src/e2e/sub/b.cy.ts").is_file());
    assert!(root.join("cypress.config.ts").is_file());
    assert!(!root.join("src/integration").exists());
    assert!(!root.join("cypress.json").exists());

    assert_eq!(
        fs::read_to_string(root.join("src/e2e/e2e.ts")).unwrap(),
        "import '../support/commands';\n"
    );
}

#[test]
fn every_spec_extension_is_discoverable() {
    let mut tree = MemoryTree::new();
    workspace(
        &mut tree,
        LEGACY_CONFIG,
        &files! {
            "src/integration/a.spec.mjs" => "",
            "src/integration/b.spec.cjs" => "",
            "src/support/index.ts" => "",
        },
    );

    migrator(Some(9)).run(&mut tree, "app-e2e", "e2e").unwrap();

    let modern = modern_config(&read(&tree, "cypress.config.ts"));
    let spec_pattern = globset::Glob::new(&modern.e2e.spec_pattern)
        .unwrap()
        .compile_matcher();

    for path in ["src/e2e/a.cy.mjs", "src/e2e/b.cy.cjs"] {
        assert!(tree.is_file(&project_path(path)), "{path} is missing");
        assert!(spec_pattern.is_match(path), "{path} isn't matched");
    }
}

#[test]
fn paths_outside_the_project_are_refused() {
    for config in [
        MigrationConfig {
            support_file: Some("../../../outside/e2e.ts".to_owned()),
            ..MigrationConfig::default()
        },
        MigrationConfig {
            integration_folder: Some("/abs/e2e".to_owned()),
            ..MigrationConfig::default()
        },
    ] {
        match Migrator::new(config, Box::new(FixedVersion(Some(9)))) {
            Err(MigrationError::OutsideProject(error)) => {
                assert!(error.to_string().contains("must be a path inside the project"))
            }
            Err(other) => panic!("expected the path to be refused, got {other}"),
            Ok(_) => panic!("expected the path to be refused"),
        }
    }
}

#[test]
fn failed_moves_keep_the_legacy_config() {
    let mut inner = MemoryTree::new();
    workspace(&mut inner, LEGACY_CONFIG, &scenario_files());

    let mut tree = FailingTree {
        inner,
        failing: Failing::Rename,
        path: project_path("src/integration/sub/b.spec.ts"),
    };

    match migrator(Some(9)).run(&mut tree, "app-e2e", "e2e") {
        Err(MigrationError::Io {
            project,
            operation,
            path,
            ..
        }) => {
            assert_eq!(project, "app-e2e");
            assert_eq!(operation, FileOperation::Move);
            assert_eq!(path, project_path("src/integration/sub/b.spec.ts"));
        }

        other => panic!("expected an io error, got {other:?}"),
    }

    assert!(tree.is_file(&project_path("cypress.json")));
    assert!(!tree.exists(&project_path("cypress.config.ts")));
}

#[test]
fn failing_to_delete_the_legacy_config_leaves_both() {
    let mut inner = MemoryTree::new();
    workspace(&mut inner, LEGACY_CONFIG, &scenario_files());

    let mut tree = FailingTree {
        inner,
        failing: Failing::Delete,
        path: project_path("cypress.json"),
    };

    let migrator = migrator(Some(9));

    match migrator.run(&mut tree, "app-e2e", "e2e") {
        Err(error @ MigrationError::Io { .. }) => {
            assert!(matches!(
                &error,
                MigrationError::Io {
                    operation: FileOperation::Delete,
                    ..
                }
            ));
            assert_eq!(
                error.to_string(),
                "[app-e2e] failed to delete `apps/app-e2e/cypress.json`: read-only file"
            );
        }

        other => panic!("expected an io error, got {other:?}"),
    }

    assert!(tree.is_file(&project_path("cypress.json")));
    assert!(tree.is_file(&project_path("cypress.config.ts")));

    assert_eq!(
        migrator.run(&mut tree.inner, "app-e2e", "e2e").unwrap(),
        MigrationOutcome::Skipped(IneligibleReason::AlreadyModernConfigPresent)
    );
}

#[test]
fn emptied_legacy_directories_are_removed() {
    let directory = tempfile::tempdir().unwrap();
    let mut tree = DiskTree::new(directory.path());
    workspace(
        &mut tree,
        r#"{ "integrationFolder": "src/integration", "supportFile": "src/support/index.ts" }"#,
        &files! {
            "src/integration/a.spec.ts" => "",
            "src/integration/sub/b.spec.ts" => "",
            "src/support/index.ts" => "",
        },
    );

    let report = match migrator(Some(9)).run(&mut tree, "app-e2e", "e2e").unwrap() {
        MigrationOutcome::Done(report) => report,
        MigrationOutcome::Skipped(reason) => panic!("migration was skipped: {reason}"),
    };

    let root = directory.path().join(PROJECT_ROOT);
    for path in ["src/e2e/a.cy.ts", "src/e2e/sub/b.cy.ts", "src/e2e/e2e.ts"] {
        assert!(root.join(path).is_file(), "{path} is missing");
    }

    assert!(!root.join("src/integration").exists());
    assert!(!root.join("src/support").exists());
    assert!(report.deleted.contains(&project_path("src/support")));
}
