use crate::{
    imports,
    project::{add_project_configuration, ProjectConfiguration, TargetConfiguration},
    tree::{FileTree, MemoryTree},
};
use std::{
    fmt, fs,
    io::Write,
    path::{Path, PathBuf},
};

lazy_static::lazy_static! {
    static ref TEST_REWRITE_ROOT: PathBuf = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("rewrite");
}

pub const PROJECT_NAME: &str = "app-e2e";
pub const PROJECT_ROOT: &str = "apps/app-e2e";

#[derive(PartialEq, Eq)]
#[doc(hidden)]
pub struct PrettyString<'a>(pub &'a str);

/// Make diff to display string as multi-line string
impl<'a> fmt::Debug for PrettyString<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Registers `app-e2e` with an `e2e` target using the cypress executor.
pub fn e2e_project(tree: &mut MemoryTree) -> ProjectConfiguration {
    let mut target = TargetConfiguration {
        executor: Some(crate::config::DEFAULT_EXECUTOR.to_owned()),
        ..TargetConfiguration::default()
    };
    target.options.insert(
        "cypressConfig".to_owned(),
        format!("{PROJECT_ROOT}/cypress.json").into(),
    );

    let mut project = ProjectConfiguration {
        root: PROJECT_ROOT.to_owned(),
        source_root: Some(format!("{PROJECT_ROOT}/src")),
        ..ProjectConfiguration::default()
    };
    project.targets.insert("e2e".to_owned(), target);

    add_project_configuration(tree, PROJECT_NAME, &project)
        .expect("couldn't add project configuration");

    project
}

/// Writes files relative to the project root.
pub fn write_files(tree: &mut MemoryTree, files: &[(&str, &str)]) {
    for (path, contents) in files {
        tree.write(&Path::new(PROJECT_ROOT).join(path), contents.as_bytes())
            .expect("couldn't write file");
    }
}

pub fn read_file(tree: &MemoryTree, path: &str) -> String {
    tree.read_to_string(&Path::new(PROJECT_ROOT).join(path))
        .unwrap_or_else(|error| panic!("couldn't read {path}: {error}"))
}

pub fn test_rewrite_snapshot(test_name: &'static str, old_specifier: &str, new_specifier: &str) {
    let path_base = TEST_REWRITE_ROOT.join(test_name);

    let source = fs::read_to_string(path_base.with_extension("ts")).expect("Cannot find source file");
    let rewritten = imports::rewrite(&source, old_specifier, new_specifier);

    let output_path = path_base.with_extension("expected.ts");

    if let Ok(expected) = fs::read_to_string(&output_path) {
        pretty_assertions::assert_eq!(PrettyString(&expected), PrettyString(&rewritten));
    } else {
        let mut output_file = fs::File::create(output_path).expect("couldn't create output file");
        output_file
            .write_all(rewritten.as_bytes())
            .expect("couldn't write to output file");
    }
}
