//! The workspace model: which projects exist, where they live and what targets they have.
//! Projects are listed in `workspace.json`, either inline or as a root directory holding a
//! `project.json`.

use std::{
    collections::BTreeMap,
    fmt, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tree::FileTree;

pub const WORKSPACE_FILE_NAME: &str = "workspace.json";
pub const PROJECT_FILE_NAME: &str = "project.json";

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfiguration {
    #[serde(default)]
    pub root: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,

    #[serde(default)]
    pub targets: BTreeMap<String, TargetConfiguration>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ProjectConfiguration {
    pub fn root(&self) -> &Path {
        Path::new(&self.root)
    }

    pub fn source_root(&self) -> PathBuf {
        match &self.source_root {
            Some(source_root) => PathBuf::from(source_root),
            None => self.root().join("src"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct TargetConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor: Option<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub configurations: BTreeMap<String, Map<String, Value>>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Deserialize, Serialize)]
struct WorkspaceConfiguration {
    #[serde(default)]
    projects: BTreeMap<String, ProjectEntry>,

    #[serde(flatten)]
    other: Map<String, Value>,
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum ProjectEntry {
    Root(String),
    Inline(ProjectConfiguration),
}

#[derive(Debug)]
pub enum ProjectError {
    Io {
        source: io::Error,
        path: PathBuf,
    },

    Json {
        source: serde_json::Error,
        path: PathBuf,
    },

    NotFound {
        name: String,
    },
}

impl fmt::Display for ProjectError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProjectError::Io { source, path } => {
                write!(formatter, "failed to access `{}`: {source}", path.display())
            }

            ProjectError::Json { source, path } => {
                write!(formatter, "failed to parse `{}`: {source}", path.display())
            }

            ProjectError::NotFound { name } => {
                write!(formatter, "cannot find configuration for project `{name}`")
            }
        }
    }
}

impl std::error::Error for ProjectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProjectError::Io { source, .. } => Some(source),
            ProjectError::Json { source, .. } => Some(source),
            ProjectError::NotFound { .. } => None,
        }
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(
    tree: &dyn FileTree,
    path: &Path,
) -> Result<T, ProjectError> {
    let contents = tree
        .read_to_string(path)
        .map_err(|source| ProjectError::Io {
            source,
            path: path.to_path_buf(),
        })?;

    serde_json::from_str(&contents).map_err(|source| ProjectError::Json {
        source,
        path: path.to_path_buf(),
    })
}

fn write_json<T: Serialize>(
    tree: &mut dyn FileTree,
    path: &Path,
    value: &T,
) -> Result<(), ProjectError> {
    let mut contents = serde_json::to_string_pretty(value).map_err(|source| ProjectError::Json {
        source,
        path: path.to_path_buf(),
    })?;
    contents.push('\n');

    tree.write(path, contents.as_bytes())
        .map_err(|source| ProjectError::Io {
            source,
            path: path.to_path_buf(),
        })
}

fn read_workspace(tree: &dyn FileTree) -> Result<WorkspaceConfiguration, ProjectError> {
    let path = Path::new(WORKSPACE_FILE_NAME);

    if !tree.is_file(path) {
        return Ok(WorkspaceConfiguration {
            projects: BTreeMap::new(),
            other: Map::new(),
        });
    }

    read_json(tree, path)
}

pub fn read_project_configuration(
    tree: &dyn FileTree,
    name: &str,
) -> Result<ProjectConfiguration, ProjectError> {
    let workspace = read_workspace(tree)?;

    match workspace.projects.get(name) {
        Some(ProjectEntry::Inline(configuration)) => Ok(configuration.clone()),

        Some(ProjectEntry::Root(root)) => {
            let mut configuration: ProjectConfiguration =
                read_json(tree, &Path::new(root).join(PROJECT_FILE_NAME))?;
            configuration.root = root.clone();
            Ok(configuration)
        }

        None => Err(ProjectError::NotFound {
            name: name.to_owned(),
        }),
    }
}

/// Writes a project back to wherever it was read from.
pub fn update_project_configuration(
    tree: &mut dyn FileTree,
    name: &str,
    configuration: &ProjectConfiguration,
) -> Result<(), ProjectError> {
    let mut workspace = read_workspace(tree)?;

    match workspace.projects.get_mut(name) {
        Some(ProjectEntry::Inline(existing)) => {
            *existing = configuration.clone();
            write_json(tree, Path::new(WORKSPACE_FILE_NAME), &workspace)
        }

        Some(ProjectEntry::Root(root)) => {
            let path = Path::new(root).join(PROJECT_FILE_NAME);
            write_json(tree, &path, configuration)
        }

        None => Err(ProjectError::NotFound {
            name: name.to_owned(),
        }),
    }
}

/// Registers a new project in `workspace.json`, with its configuration in `<root>/project.json`.
pub fn add_project_configuration(
    tree: &mut dyn FileTree,
    name: &str,
    configuration: &ProjectConfiguration,
) -> Result<(), ProjectError> {
    let mut workspace = read_workspace(tree)?;

    workspace
        .projects
        .insert(name.to_owned(), ProjectEntry::Root(configuration.root.clone()));

    write_json(tree, Path::new(WORKSPACE_FILE_NAME), &workspace)?;
    write_json(
        tree,
        &configuration.root().join(PROJECT_FILE_NAME),
        configuration,
    )
}
