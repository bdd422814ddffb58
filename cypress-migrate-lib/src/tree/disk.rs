use std::{
    fs, io,
    path::{Path, PathBuf},
};

use super::FileTree;

/// A tree backed by a directory on disk.
#[derive(Clone, Debug)]
pub struct DiskTree {
    root: PathBuf,
}

impl DiskTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }

    fn create_parent(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) => fs::create_dir_all(parent),
            None => Ok(()),
        }
    }
}

impl FileTree for DiskTree {
    fn exists(&self, path: &Path) -> bool {
        self.absolute(path).exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.absolute(path).is_file()
    }

    fn children(&self, directory: &Path) -> io::Result<Vec<PathBuf>> {
        let absolute = self.absolute(directory);
        if !absolute.is_dir() {
            return Ok(Vec::new());
        }

        let mut children = Vec::new();
        for entry in fs::read_dir(&absolute)? {
            children.push(self.relative(&entry?.path()));
        }

        children.sort();
        Ok(children)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(self.absolute(path))
    }

    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let absolute = self.absolute(path);
        self.create_parent(&absolute)?;
        fs::write(absolute, contents)
    }

    fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        let to = self.absolute(to);
        self.create_parent(&to)?;
        fs::rename(self.absolute(from), to)
    }

    fn delete(&mut self, path: &Path) -> io::Result<()> {
        let absolute = self.absolute(path);

        if absolute.is_dir() {
            fs::remove_dir_all(absolute)
        } else {
            fs::remove_file(absolute)
        }
    }

    fn files_under(&self, directory: &Path) -> io::Result<Vec<PathBuf>> {
        let absolute = self.absolute(directory);
        if !absolute.is_dir() {
            return Ok(Vec::new());
        }

        let pattern = format!(
            "{}/**/*",
            glob::Pattern::escape(&absolute.to_string_lossy())
        );

        let entries = glob::glob_with(
            &pattern,
            glob::MatchOptions {
                require_literal_leading_dot: false,
                ..glob::MatchOptions::new()
            },
        )
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(glob::GlobError::into_error)?;
            if path.is_file() {
                files.push(self.relative(&path));
            }
        }

        files.sort();
        Ok(files)
    }
}
