use std::{
    collections::{BTreeMap, BTreeSet},
    io,
    path::{Component, Path, PathBuf},
};

use super::FileTree;
use crate::paths;

/// An in-memory tree. Directories only exist through the files inside them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryTree {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every file in the tree, sorted.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("`{}` does not exist", path.display()),
        )
    }
}

impl FileTree for MemoryTree {
    fn exists(&self, path: &Path) -> bool {
        let path = paths::normalize(path);

        self.files.keys().any(|file| file.starts_with(&path))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&paths::normalize(path))
    }

    fn children(&self, directory: &Path) -> io::Result<Vec<PathBuf>> {
        let directory = paths::normalize(directory);
        let mut children = BTreeSet::new();

        for file in self.files.keys() {
            if let Ok(rest) = file.strip_prefix(&directory) {
                if let Some(Component::Normal(name)) = rest.components().next() {
                    children.insert(directory.join(name));
                }
            }
        }

        Ok(children.into_iter().collect())
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .get(&paths::normalize(path))
            .cloned()
            .ok_or_else(|| Self::not_found(path))
    }

    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.files.insert(paths::normalize(path), contents.to_vec());
        Ok(())
    }

    fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        let contents = self
            .files
            .remove(&paths::normalize(from))
            .ok_or_else(|| Self::not_found(from))?;

        self.files.insert(paths::normalize(to), contents);
        Ok(())
    }

    fn delete(&mut self, path: &Path) -> io::Result<()> {
        let path = paths::normalize(path);
        self.files.retain(|file, _| !file.starts_with(&path));
        Ok(())
    }
}
