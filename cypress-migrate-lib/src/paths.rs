//! Lexical path helpers. Every path handled by the migration is relative to the
//! workspace root and never touches the file system here.

use std::path::{Component, Path, PathBuf};

/// Collapses `.` and `..` components without consulting the file system.
/// Leading `..` components that can't be popped are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                _ => components.push(component),
            },
            other => components.push(other),
        }
    }

    components.iter().collect()
}

/// Joins a workspace relative directory with a path read from a config file.
pub fn join(base: &Path, path: &str) -> PathBuf {
    normalize(&base.join(path))
}

/// Renders a path with forward slashes, the way specifiers and config files expect.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// The path of `to` relative to `from`, both workspace relative, with forward slashes.
pub fn relative(from: &Path, to: &Path) -> String {
    let from = normalize(from);
    let to = normalize(to);

    let from_components: Vec<_> = from.components().collect();
    let to_components: Vec<_> = to.components().collect();

    let common = from_components
        .iter()
        .zip(&to_components)
        .take_while(|(left, right)| left == right)
        .count();

    let mut segments = vec![".."; from_components.len() - common];
    let rest: Vec<_> = to_components[common..]
        .iter()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect();

    segments.extend(rest.iter().map(|segment| &**segment));
    segments.join("/")
}

/// Like [`relative`], but always produces something an `import` treats as a relative
/// module specifier: `./x` rather than `x`.
pub fn relative_specifier(from_dir: &Path, to: &Path) -> String {
    let relative = relative(from_dir, to);

    if relative.is_empty() {
        ".".to_owned()
    } else if relative == ".." || relative.starts_with("../") {
        relative
    } else {
        format!("./{relative}")
    }
}

/// Whether a module specifier is relative to the importing file.
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Strips the final extension, if there is one: `a.cy.ts` becomes `a.cy`.
pub fn without_extension(path: &Path) -> PathBuf {
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(_)) => path.with_file_name(stem),
        _ => path.to_path_buf(),
    }
}

pub fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|extension| extension.to_str())
}

pub fn file_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
}
