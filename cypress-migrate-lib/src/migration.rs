//! Sequences a migration: version probe, eligibility, planning, and only then the
//! changes to the tree. Everything up to and including planning only reads.

use std::{
    collections::BTreeSet,
    ffi::OsStr,
    fmt, io,
    path::{Path, PathBuf},
};

use globset::GlobSet;
use serde::Serialize;
use serde_json::Value;

use crate::{
    config::{MigrationConfig, OutsideProjectError},
    eligibility::{self, IneligibleReason},
    imports::{self, RewriteRule},
    logs::{self, LogMessage},
    paths,
    planner::{
        FileKind, LegacyPaths, ModernPaths, PathMapping, PathPlanner, PlannedMove, PlanningError,
        SOURCE_EXTENSIONS,
    },
    project::{self, ProjectConfiguration, ProjectError},
    runner_config::{self, LegacyConfig, ModernLayout, SupportFile, LEGACY_CONFIG_FILE_NAME},
    tree::FileTree,
    version::VersionProbe,
};

pub const CYPRESS_CONFIG_OPTION: &str = "cypressConfig";

const STAGING_DIRECTORY: &str = ".cypress-migrate-staging";

// Extensions a relative `import` or `require` may leave out.
const MODULE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "cjs", "mjs", "json"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileOperation {
    List,
    Read,
    Write,
    Move,
    Delete,
}

impl fmt::Display for FileOperation {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(match self {
            FileOperation::List => "list",
            FileOperation::Read => "read",
            FileOperation::Write => "write",
            FileOperation::Move => "move",
            FileOperation::Delete => "delete",
        })
    }
}

#[derive(Debug)]
pub enum MigrationError {
    InvalidExclude(globset::Error),

    OutsideProject(OutsideProjectError),

    Project(ProjectError),

    MissingRunnerConfig {
        project: String,
        path: PathBuf,
    },

    InvalidRunnerConfig {
        project: String,
        path: PathBuf,
        source: serde_json::Error,
    },

    Planning {
        project: String,
        source: PlanningError,
    },

    Io {
        project: String,
        operation: FileOperation,
        path: PathBuf,
        source: io::Error,
    },

    RenderConfig {
        project: String,
        source: serde_json::Error,
    },
}

impl fmt::Display for MigrationError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MigrationError::InvalidExclude(error) => {
                write!(formatter, "invalid exclude pattern: {error}")
            }

            MigrationError::OutsideProject(error) => write!(formatter, "{error}"),

            MigrationError::Project(error) => write!(formatter, "{error}"),

            MigrationError::MissingRunnerConfig { project, path } => write!(
                formatter,
                "[{project}] cannot find `{}`",
                path.display()
            ),

            MigrationError::InvalidRunnerConfig {
                project,
                path,
                source,
            } => write!(
                formatter,
                "[{project}] `{}` is not a valid cypress.json: {source}",
                path.display()
            ),

            MigrationError::Planning { project, source } => {
                write!(formatter, "[{project}] {source}")
            }

            MigrationError::Io {
                project,
                operation,
                path,
                source,
            } => write!(
                formatter,
                "[{project}] failed to {operation} `{}`: {source}",
                path.display()
            ),

            MigrationError::RenderConfig { project, source } => write!(
                formatter,
                "[{project}] couldn't render the new config: {source}"
            ),
        }
    }
}

impl std::error::Error for MigrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MigrationError::InvalidExclude(error) => Some(error),
            MigrationError::OutsideProject(error) => Some(error),
            MigrationError::Project(error) => Some(error),
            MigrationError::MissingRunnerConfig { .. } => None,
            MigrationError::InvalidRunnerConfig { source, .. } => Some(source),
            MigrationError::Planning { source, .. } => Some(source),
            MigrationError::Io { source, .. } => Some(source),
            MigrationError::RenderConfig { source, .. } => Some(source),
        }
    }
}

fn io_error<'a>(
    project: &'a str,
    operation: FileOperation,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> MigrationError + 'a {
    move |source| MigrationError::Io {
        project: project.to_owned(),
        operation,
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MigrationOutcome<T> {
    Done(T),
    /// The project can't be migrated. Nothing was changed.
    Skipped(IneligibleReason),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileRewrite {
    /// Where the file is before it is moved.
    pub path: PathBuf,
    pub replacements: usize,
    #[serde(skip)]
    pub contents: String,
}

/// Everything a migration will do, computed without touching the tree.
#[derive(Clone, Debug, Serialize)]
pub struct MigrationPlan {
    pub project: String,
    pub legacy_config: PathBuf,
    pub modern_config: PathBuf,
    pub modern_config_source: String,
    pub mapping: PathMapping,
    pub rewrites: Vec<FileRewrite>,

    /// Set when some destination is also a source, see [`PathMapping::has_aliasing`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_directory: Option<PathBuf>,

    /// Legacy directories, removed once no files are left in them.
    pub cleanup: Vec<PathBuf>,

    #[serde(skip)]
    configuration: ProjectConfiguration,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub project: String,
    pub moved_files: usize,
    pub rewritten_files: usize,
    pub replacements: usize,
    pub modern_config: PathBuf,
    pub deleted: Vec<PathBuf>,
}

pub struct Migrator {
    config: MigrationConfig,
    exclude: GlobSet,
    probe: Box<dyn VersionProbe>,
}

impl Migrator {
    pub fn new(
        config: MigrationConfig,
        probe: Box<dyn VersionProbe>,
    ) -> Result<Self, MigrationError> {
        config
            .check_paths()
            .map_err(MigrationError::OutsideProject)?;

        Ok(Self {
            exclude: config
                .exclude_set()
                .map_err(MigrationError::InvalidExclude)?,
            config,
            probe,
        })
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn run(
        &self,
        tree: &mut dyn FileTree,
        project_name: &str,
        target_name: &str,
    ) -> Result<MigrationOutcome<MigrationReport>, MigrationError> {
        match self.plan(tree, project_name, target_name)? {
            MigrationOutcome::Done(plan) => plan.apply(tree).map(MigrationOutcome::Done),
            MigrationOutcome::Skipped(reason) => Ok(MigrationOutcome::Skipped(reason)),
        }
    }

    pub fn plan(
        &self,
        tree: &dyn FileTree,
        project_name: &str,
        target_name: &str,
    ) -> Result<MigrationOutcome<MigrationPlan>, MigrationError> {
        profiling::scope!("Migrator::plan");

        let configuration = project::read_project_configuration(tree, project_name)
            .map_err(MigrationError::Project)?;

        let eligibility = eligibility::check(
            tree,
            &configuration,
            target_name,
            &self.config.executor,
            self.probe.as_ref(),
        );

        if let Some(reason) = eligibility.reason() {
            return Ok(MigrationOutcome::Skipped(reason));
        }

        let root = configuration.root().to_path_buf();
        let legacy_config_path = legacy_config_path(&configuration, target_name);

        if !tree.is_file(&legacy_config_path) {
            return Err(MigrationError::MissingRunnerConfig {
                project: project_name.to_owned(),
                path: legacy_config_path,
            });
        }

        let legacy_source = tree
            .read_to_string(&legacy_config_path)
            .map_err(io_error(project_name, FileOperation::Read, &legacy_config_path))?;

        let legacy = LegacyConfig::from_json(&legacy_source).map_err(|source| {
            MigrationError::InvalidRunnerConfig {
                project: project_name.to_owned(),
                path: legacy_config_path.clone(),
                source,
            }
        })?;

        let snapshot = tree
            .files_under(&root)
            .map_err(io_error(project_name, FileOperation::List, &root))?;

        let legacy_paths = LegacyPaths::resolve(&configuration, &legacy, &snapshot);
        let mut layout = self.layout(&legacy, &legacy_paths);
        let modern_paths = ModernPaths::new(&configuration, &layout);

        let mapping = PathPlanner::new(&legacy_paths, &modern_paths, self.config.unrecognized_specs)
            .plan(&snapshot)
            .map_err(|source| MigrationError::Planning {
                project: project_name.to_owned(),
                source,
            })?;

        if mapping
            .moves()
            .iter()
            .any(|planned| planned.kind == FileKind::Fixture)
        {
            layout.fixtures_folder = Some(paths::relative(&root, &modern_paths.fixtures_folder));
        }

        let rewrites = self.plan_rewrites(tree, project_name, &root, &snapshot, &mapping)?;

        let language = runner_config::project_language(
            tree,
            &root,
            modern_paths.support_file.as_deref(),
        );

        let modern_config_source = legacy
            .upgrade(layout)
            .to_source(language)
            .map_err(|source| MigrationError::RenderConfig {
                project: project_name.to_owned(),
                source,
            })?;

        let staging_directory = if mapping.has_aliasing() {
            (0usize..)
                .map(|attempt| match attempt {
                    0 => root.join(STAGING_DIRECTORY),
                    _ => root.join(format!("{STAGING_DIRECTORY}-{attempt}")),
                })
                .find(|candidate| !tree.exists(candidate))
        } else {
            None
        };

        let mut cleanup = vec![legacy_paths.integration_folder.clone()];
        if let Some(support_directory) = legacy_paths
            .support_file
            .as_deref()
            .and_then(Path::parent)
        {
            if support_directory != root && !cleanup.iter().any(|path| path == support_directory) {
                cleanup.push(support_directory.to_path_buf());
            }
        }
        cleanup.retain(|directory| directory != &root);

        Ok(MigrationOutcome::Done(MigrationPlan {
            project: project_name.to_owned(),
            modern_config: root.join(language.file_name()),
            legacy_config: legacy_config_path,
            modern_config_source,
            mapping,
            rewrites,
            staging_directory,
            cleanup,
            configuration,
        }))
    }

    fn layout(&self, legacy: &LegacyConfig, legacy_paths: &LegacyPaths) -> ModernLayout {
        let integration_folder = self.config.integration_folder.clone().unwrap_or_else(|| {
            ModernLayout::default_integration_folder(&legacy.integration_folder)
        });

        // A support file that doesn't exist is disabled rather than pointed at nothing.
        let support_file = match &legacy_paths.support_file {
            Some(support_file) => SupportFile::Path(match &self.config.support_file {
                Some(configured) => configured.clone(),
                None => ModernLayout::default_support_file(
                    &integration_folder,
                    paths::extension(support_file).unwrap_or("js"),
                ),
            }),

            None => SupportFile::Disabled,
        };

        ModernLayout {
            integration_folder,
            support_file,
            fixtures_folder: None,
        }
    }

    fn is_excluded(&self, root: &Path, file: &Path) -> bool {
        file.strip_prefix(root)
            .map_or(false, |relative| self.exclude.is_match(relative))
    }

    /// Rewrites relative specifiers in every source file of the project so that they still
    /// resolve once the moves are applied. Files that don't move are included, since what
    /// they import might.
    fn plan_rewrites(
        &self,
        tree: &dyn FileTree,
        project_name: &str,
        root: &Path,
        snapshot: &[PathBuf],
        mapping: &PathMapping,
    ) -> Result<Vec<FileRewrite>, MigrationError> {
        profiling::scope!("Migrator::plan_rewrites");

        let files: BTreeSet<&Path> = snapshot.iter().map(PathBuf::as_path).collect();
        let mut rewrites = Vec::new();

        for file in snapshot {
            if !is_source_file(file) || self.is_excluded(root, file) {
                continue;
            }

            let planned = mapping.get(file);
            if planned.map_or(false, |planned| !planned.is_source()) {
                continue;
            }

            let destination = planned.map_or(file.as_path(), |planned| planned.to.as_path());

            let contents = tree
                .read_to_string(file)
                .map_err(io_error(project_name, FileOperation::Read, file))?;

            let rules = relocation_rules(&contents, file, destination, mapping, &files);
            let (contents, replacements) = imports::rewrite_all(&contents, &rules);

            if replacements > 0 {
                rewrites.push(FileRewrite {
                    path: file.clone(),
                    replacements,
                    contents,
                });
            }
        }

        Ok(rewrites)
    }
}

impl MigrationPlan {
    /// Rewrites imports, moves files, then replaces the config. The new config is written
    /// before the old one is deleted, so a failure in between leaves a project that is
    /// declined on the next run instead of being migrated twice.
    pub fn apply(self, tree: &mut dyn FileTree) -> Result<MigrationReport, MigrationError> {
        profiling::scope!("MigrationPlan::apply");

        let project = self.project.as_str();
        let mut report = MigrationReport {
            project: self.project.clone(),
            modern_config: self.modern_config.clone(),
            ..MigrationReport::default()
        };

        for rewrite in &self.rewrites {
            tree.write(&rewrite.path, rewrite.contents.as_bytes())
                .map_err(io_error(project, FileOperation::Write, &rewrite.path))?;

            logs::log(LogMessage::RewroteImports {
                path: rewrite.path.clone(),
                replacements: rewrite.replacements,
            });

            report.rewritten_files += 1;
            report.replacements += rewrite.replacements;
        }

        report.moved_files = apply_moves(
            tree,
            project,
            &self.mapping,
            self.staging_directory.as_deref(),
        )?;

        for directory in &self.cleanup {
            if !tree.exists(directory) {
                continue;
            }

            let remaining = tree
                .files_under(directory)
                .map_err(io_error(project, FileOperation::List, directory))?;

            if remaining.is_empty() {
                delete(tree, project, directory)?;
                report.deleted.push(directory.clone());
            }
        }

        tree.write(&self.modern_config, self.modern_config_source.as_bytes())
            .map_err(io_error(project, FileOperation::Write, &self.modern_config))?;
        logs::log(LogMessage::WroteFile {
            path: self.modern_config.clone(),
        });

        delete(tree, project, &self.legacy_config)?;
        report.deleted.push(self.legacy_config.clone());

        let mut configuration = self.configuration.clone();
        if repoint_config_option(&mut configuration, &self.legacy_config, &self.modern_config) {
            project::update_project_configuration(tree, project, &configuration)
                .map_err(MigrationError::Project)?;

            logs::log(LogMessage::UpdatedProjectConfiguration {
                project: self.project.clone(),
            });
        }

        Ok(report)
    }
}

fn apply_moves(
    tree: &mut dyn FileTree,
    project: &str,
    mapping: &PathMapping,
    staging_directory: Option<&Path>,
) -> Result<usize, MigrationError> {
    profiling::scope!("apply_moves");

    let moves: Vec<&PlannedMove> = mapping
        .moves()
        .iter()
        .filter(|planned| planned.from != planned.to)
        .collect();

    match staging_directory {
        Some(staging_directory) => {
            logs::log(LogMessage::StagedMoves {
                staging_directory: staging_directory.to_path_buf(),
                files: moves.len(),
            });

            let staged: Vec<PathBuf> = (0..moves.len())
                .map(|index| staging_directory.join(index.to_string()))
                .collect();

            for (planned, staged) in moves.iter().zip(&staged) {
                move_file(tree, project, &planned.from, staged)?;
            }

            for (planned, staged) in moves.iter().zip(&staged) {
                move_file(tree, project, staged, &planned.to)?;
                logs::log(LogMessage::MovedFile {
                    from: planned.from.clone(),
                    to: planned.to.clone(),
                });
            }

            if tree.exists(staging_directory) {
                delete(tree, project, staging_directory)?;
            }
        }

        None => {
            for planned in &moves {
                move_file(tree, project, &planned.from, &planned.to)?;
                logs::log(LogMessage::MovedFile {
                    from: planned.from.clone(),
                    to: planned.to.clone(),
                });
            }
        }
    }

    Ok(moves.len())
}

fn move_file(
    tree: &mut dyn FileTree,
    project: &str,
    from: &Path,
    to: &Path,
) -> Result<(), MigrationError> {
    tree.rename(from, to)
        .map_err(io_error(project, FileOperation::Move, from))
}

fn delete(tree: &mut dyn FileTree, project: &str, path: &Path) -> Result<(), MigrationError> {
    tree.delete(path)
        .map_err(io_error(project, FileOperation::Delete, path))?;

    logs::log(LogMessage::DeletedPath {
        path: path.to_path_buf(),
    });

    Ok(())
}

/// The legacy config a target uses, defaulting to `cypress.json` at the project root.
fn legacy_config_path(configuration: &ProjectConfiguration, target_name: &str) -> PathBuf {
    configuration
        .targets
        .get(target_name)
        .and_then(|target| target.options.get(CYPRESS_CONFIG_OPTION))
        .and_then(Value::as_str)
        .map(|path| paths::normalize(Path::new(path)))
        .unwrap_or_else(|| configuration.root().join(LEGACY_CONFIG_FILE_NAME))
}

/// Points every `cypressConfig` option that names the legacy config at the new one.
/// Returns whether anything changed.
fn repoint_config_option(
    configuration: &mut ProjectConfiguration,
    legacy_config: &Path,
    modern_config: &Path,
) -> bool {
    let mut changed = false;

    for target in configuration.targets.values_mut() {
        for options in std::iter::once(&mut target.options).chain(target.configurations.values_mut())
        {
            let points_at_legacy = options
                .get(CYPRESS_CONFIG_OPTION)
                .and_then(Value::as_str)
                .map_or(false, |path| paths::normalize(Path::new(path)) == legacy_config);

            if points_at_legacy {
                options.insert(
                    CYPRESS_CONFIG_OPTION.to_owned(),
                    Value::String(paths::to_slash(modern_config)),
                );
                changed = true;
            }
        }
    }

    changed
}

fn is_source_file(path: &Path) -> bool {
    let in_node_modules = path
        .components()
        .any(|component| component.as_os_str() == "node_modules");

    !in_node_modules
        && paths::extension(path).map_or(false, |extension| SOURCE_EXTENSIONS.contains(&extension))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resolution {
    Exact,
    WithoutExtension,
    Index,
}

impl Resolution {
    /// What a specifier should name to reach `file` the same way it was reached before.
    fn specifier_target(self, file: &Path) -> PathBuf {
        match self {
            Resolution::Exact => file.to_path_buf(),
            Resolution::WithoutExtension => paths::without_extension(file),
            Resolution::Index => {
                if file.file_stem() == Some(OsStr::new("index")) {
                    file.parent().map(Path::to_path_buf).unwrap_or_default()
                } else {
                    paths::without_extension(file)
                }
            }
        }
    }
}

/// Resolves a relative module the way node does: the path itself, then with an
/// extension added, then an index file inside it.
fn resolve_module(files: &BTreeSet<&Path>, target: &Path) -> Option<(PathBuf, Resolution)> {
    if files.contains(target) {
        return Some((target.to_path_buf(), Resolution::Exact));
    }

    for extension in MODULE_EXTENSIONS {
        let mut candidate = target.as_os_str().to_owned();
        candidate.push(".");
        candidate.push(extension);

        let candidate = PathBuf::from(candidate);
        if files.contains(candidate.as_path()) {
            return Some((candidate, Resolution::WithoutExtension));
        }
    }

    SOURCE_EXTENSIONS
        .iter()
        .map(|extension| target.join(format!("index.{extension}")))
        .find(|candidate| files.contains(candidate.as_path()))
        .map(|candidate| (candidate, Resolution::Index))
}

/// Rules re-pointing every relative specifier of a file moving from `from` to `to`.
fn relocation_rules(
    contents: &str,
    from: &Path,
    to: &Path,
    mapping: &PathMapping,
    files: &BTreeSet<&Path>,
) -> Vec<RewriteRule> {
    let old_directory = from.parent().unwrap_or_else(|| Path::new(""));
    let new_directory = to.parent().unwrap_or_else(|| Path::new(""));

    imports::specifiers(contents)
        .into_iter()
        .filter(|specifier| paths::is_relative_specifier(specifier))
        .filter_map(|specifier| {
            let target = paths::join(old_directory, &specifier);

            // Anything that doesn't resolve to a project file is left alone.
            let (file, resolution) = resolve_module(files, &target)?;

            let (relocated, target_moved) = match mapping.get(&file) {
                Some(planned) => (
                    resolution.specifier_target(&planned.to),
                    planned.from != planned.to,
                ),
                None => (resolution.specifier_target(&file), false),
            };

            if !target_moved && old_directory == new_directory {
                return None;
            }

            let new_specifier = paths::relative_specifier(new_directory, &relocated);

            if new_specifier == specifier {
                None
            } else {
                Some(RewriteRule::new(specifier, new_specifier))
            }
        })
        .collect()
}
