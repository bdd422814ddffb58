//! Works out where every file of the legacy layout ends up. Planning only looks at a
//! snapshot of the project's files and never touches the tree.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::{Component, Path, PathBuf},
};

use serde::Serialize;

use crate::{
    config::UnrecognizedSpecs,
    paths,
    project::ProjectConfiguration,
    runner_config::{LegacyConfig, ModernLayout},
};

pub const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "cjs", "mjs"];

const FIXTURES_DIRECTORY: &str = "fixtures";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    SupportFile,
    Spec,
    /// A source file in the integration folder that isn't a spec, such as a helper.
    Source,
    Fixture,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlannedMove {
    pub from: PathBuf,
    pub to: PathBuf,
    pub kind: FileKind,
}

impl PlannedMove {
    /// Whether the file holds source text whose imports should follow the move.
    pub fn is_source(&self) -> bool {
        matches!(
            self.kind,
            FileKind::SupportFile | FileKind::Spec | FileKind::Source
        ) && paths::extension(&self.from).map_or(false, |extension| {
            SOURCE_EXTENSIONS.contains(&extension)
        })
    }
}

/// Every planned move, sorted by source path. Sources are unique, and so are destinations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PathMapping {
    moves: Vec<PlannedMove>,
}

impl PathMapping {
    pub fn moves(&self) -> &[PlannedMove] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn get(&self, from: &Path) -> Option<&PlannedMove> {
        self.moves
            .binary_search_by(|planned| planned.from.as_path().cmp(from))
            .ok()
            .map(|index| &self.moves[index])
    }

    /// Whether some file would be moved onto a path another move reads from. When that is
    /// the case, moves can't be applied one after the other in place.
    pub fn has_aliasing(&self) -> bool {
        self.moves
            .iter()
            .any(|planned| planned.from != planned.to && self.get(&planned.to).is_some())
    }
}

/// Sorts the moves by source. Conflicts aren't checked here, that's the planner's job.
impl FromIterator<PlannedMove> for PathMapping {
    fn from_iter<I: IntoIterator<Item = PlannedMove>>(iter: I) -> Self {
        let mut moves: Vec<PlannedMove> = iter.into_iter().collect();
        moves.sort_by(|left, right| left.from.cmp(&right.from));
        Self { moves }
    }
}

/// The legacy locations of a project, workspace relative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyPaths {
    pub integration_folder: PathBuf,
    /// The support file as it exists on disk, if there is one.
    pub support_file: Option<PathBuf>,
}

impl LegacyPaths {
    pub fn resolve(project: &ProjectConfiguration, legacy: &LegacyConfig, snapshot: &[PathBuf]) -> Self {
        let root = project.root();

        Self {
            integration_folder: paths::join(root, &legacy.integration_folder),
            support_file: legacy
                .support_file
                .path()
                .and_then(|support_file| resolve_support_file(snapshot, &paths::join(root, support_file))),
        }
    }
}

/// The new locations of a project, workspace relative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModernPaths {
    pub integration_folder: PathBuf,
    pub support_file: Option<PathBuf>,
    pub fixtures_folder: PathBuf,
}

impl ModernPaths {
    pub fn new(project: &ProjectConfiguration, layout: &ModernLayout) -> Self {
        let root = project.root();

        Self {
            integration_folder: paths::join(root, &layout.integration_folder),
            support_file: layout
                .support_file
                .path()
                .map(|support_file| paths::join(root, support_file)),
            fixtures_folder: paths::normalize(&project.source_root().join(FIXTURES_DIRECTORY)),
        }
    }
}

/// Finds the support file the way the runner does: the configured path itself, the same
/// path with any source extension, or an index file inside it.
pub fn resolve_support_file(snapshot: &[PathBuf], configured: &Path) -> Option<PathBuf> {
    let files: BTreeSet<&Path> = snapshot.iter().map(PathBuf::as_path).collect();

    if files.contains(configured) {
        return Some(configured.to_path_buf());
    }

    let without_extension = paths::without_extension(configured);

    SOURCE_EXTENSIONS
        .iter()
        .map(|extension| without_extension.with_extension(extension))
        .chain(
            SOURCE_EXTENSIONS
                .iter()
                .map(|extension| configured.join(format!("index.{extension}"))),
        )
        .find(|candidate| files.contains(candidate.as_path()))
}

/// `login.spec.ts` becomes `login.cy.ts`. `None` for anything that isn't a spec file.
pub fn spec_file_rename(file_name: &str) -> Option<String> {
    SOURCE_EXTENSIONS.iter().find_map(|extension| {
        let stem = file_name.strip_suffix(&format!(".spec.{extension}"))?;

        if stem.is_empty() {
            None
        } else {
            Some(format!("{stem}.cy.{extension}"))
        }
    })
}

#[derive(Debug, PartialEq, Eq)]
pub enum PlanningError {
    /// Two files would be moved to the same place.
    Conflict {
        destination: PathBuf,
        sources: (PathBuf, PathBuf),
    },

    /// A file would be moved on top of one that already exists and isn't moving.
    DestinationExists {
        destination: PathBuf,
        source: PathBuf,
    },

    UnrecognizedSpecFile {
        path: PathBuf,
    },
}

impl fmt::Display for PlanningError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlanningError::Conflict {
                destination,
                sources,
            } => write!(
                formatter,
                "both `{}` and `{}` would be moved to `{}`",
                sources.0.display(),
                sources.1.display(),
                destination.display(),
            ),

            PlanningError::DestinationExists {
                destination,
                source,
            } => write!(
                formatter,
                "`{}` would be moved to `{}`, which already exists",
                source.display(),
                destination.display(),
            ),

            PlanningError::UnrecognizedSpecFile { path } => write!(
                formatter,
                "`{}` looks like a spec file, but its extension isn't one of {}",
                path.display(),
                SOURCE_EXTENSIONS.join(", "),
            ),
        }
    }
}

impl std::error::Error for PlanningError {}

pub struct PathPlanner<'a> {
    legacy: &'a LegacyPaths,
    modern: &'a ModernPaths,
    unrecognized_specs: UnrecognizedSpecs,
}

impl<'a> PathPlanner<'a> {
    pub fn new(
        legacy: &'a LegacyPaths,
        modern: &'a ModernPaths,
        unrecognized_specs: UnrecognizedSpecs,
    ) -> Self {
        Self {
            legacy,
            modern,
            unrecognized_specs,
        }
    }

    /// Plans a move for the support file and every file under the legacy integration
    /// folder. `snapshot` is every file of the project.
    pub fn plan(&self, snapshot: &[PathBuf]) -> Result<PathMapping, PlanningError> {
        profiling::scope!("PathPlanner::plan");

        let mut moves = Vec::new();

        if let (Some(from), Some(to)) = (&self.legacy.support_file, &self.modern.support_file) {
            moves.push(PlannedMove {
                from: from.clone(),
                to: to.clone(),
                kind: FileKind::SupportFile,
            });
        }

        for file in snapshot {
            if Some(file) == self.legacy.support_file.as_ref() {
                continue;
            }

            if let Ok(relative) = file.strip_prefix(&self.legacy.integration_folder) {
                moves.push(self.plan_integration_file(file, relative)?);
            }
        }

        let mapping: PathMapping = moves.into_iter().collect();
        check_conflicts(mapping.moves(), snapshot)?;

        Ok(mapping)
    }

    fn plan_integration_file(
        &self,
        file: &Path,
        relative: &Path,
    ) -> Result<PlannedMove, PlanningError> {
        let mut components = relative.components();

        if components.next() == Some(Component::Normal(FIXTURES_DIRECTORY.as_ref())) {
            let rest = components.as_path();

            if !rest.as_os_str().is_empty() {
                return Ok(PlannedMove {
                    from: file.to_path_buf(),
                    to: self.modern.fixtures_folder.join(rest),
                    kind: FileKind::Fixture,
                });
            }
        }

        let file_name = paths::file_name(file);

        if let Some(renamed) = spec_file_rename(file_name) {
            return Ok(PlannedMove {
                from: file.to_path_buf(),
                to: self
                    .modern
                    .integration_folder
                    .join(relative.with_file_name(renamed)),
                kind: FileKind::Spec,
            });
        }

        if file_name.contains(".spec.") && self.unrecognized_specs == UnrecognizedSpecs::Deny {
            return Err(PlanningError::UnrecognizedSpecFile {
                path: file.to_path_buf(),
            });
        }

        let is_source =
            paths::extension(file).map_or(false, |extension| SOURCE_EXTENSIONS.contains(&extension));

        Ok(PlannedMove {
            from: file.to_path_buf(),
            to: self.modern.integration_folder.join(relative),
            kind: if is_source {
                FileKind::Source
            } else {
                FileKind::Other
            },
        })
    }
}

fn check_conflicts(moves: &[PlannedMove], snapshot: &[PathBuf]) -> Result<(), PlanningError> {
    let sources: BTreeSet<&Path> = moves.iter().map(|planned| planned.from.as_path()).collect();
    let existing: BTreeSet<&Path> = snapshot.iter().map(PathBuf::as_path).collect();
    let mut destinations: BTreeMap<&Path, &Path> = BTreeMap::new();

    for planned in moves {
        if let Some(previous) = destinations.insert(&planned.to, &planned.from) {
            return Err(PlanningError::Conflict {
                destination: planned.to.clone(),
                sources: (previous.to_path_buf(), planned.from.clone()),
            });
        }

        if existing.contains(planned.to.as_path()) && !sources.contains(planned.to.as_path()) {
            return Err(PlanningError::DestinationExists {
                destination: planned.to.clone(),
                source: planned.from.clone(),
            });
        }
    }

    Ok(())
}
