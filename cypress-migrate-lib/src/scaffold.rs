//! Boilerplate files for component testing, added next to an existing project.

use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use crate::{
    logs::{self, LogMessage},
    project::ProjectConfiguration,
    runner_config::{self, ConfigLanguage},
    tree::FileTree,
};

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <meta http-equiv="X-UA-Compatible" content="IE=edge">
    <meta name="viewport" content="width=device-width,initial-scale=1.0">
    <title>Components App</title>
  </head>
  <body>
    <div data-cy-root></div>
  </body>
</html>
"#;

const EXAMPLE_FIXTURE: &str = r#"{
  "name": "Using fixtures to represent data",
  "email": "hello@cypress.io"
}
"#;

const COMPONENT_SUPPORT: &str = "// This file is processed and loaded automatically before your component test files.
// You can change the location of this file or turn off processing it by setting the
// `component.supportFile` config option.

import './commands';
";

#[derive(Debug)]
pub struct ScaffoldError {
    pub path: PathBuf,
    pub source: io::Error,
}

impl fmt::Display for ScaffoldError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "failed to write `{}`: {}",
            self.path.display(),
            self.source
        )
    }
}

impl std::error::Error for ScaffoldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// The files, relative to the project root, with their contents.
pub fn component_files(language: ConfigLanguage) -> Vec<(PathBuf, &'static str)> {
    vec![
        (PathBuf::from("cypress/component/index.html"), INDEX_HTML),
        (PathBuf::from("cypress/fixtures/example.json"), EXAMPLE_FIXTURE),
        (
            Path::new("cypress/support").join(format!("component.{}", language.extension())),
            COMPONENT_SUPPORT,
        ),
    ]
}

/// Writes the component testing files that don't exist yet. Returns the ones written.
pub fn add_component_files(
    tree: &mut dyn FileTree,
    project: &ProjectConfiguration,
) -> Result<Vec<PathBuf>, ScaffoldError> {
    let root = project.root();
    let language = runner_config::project_language(tree, root, None);
    let mut written = Vec::new();

    for (path, contents) in component_files(language) {
        let path = root.join(path);

        if tree.exists(&path) {
            continue;
        }

        tree.write(&path, contents.as_bytes())
            .map_err(|source| ScaffoldError {
                path: path.clone(),
                source,
            })?;

        logs::log(LogMessage::WroteFile { path: path.clone() });
        written.push(path);
    }

    Ok(written)
}
