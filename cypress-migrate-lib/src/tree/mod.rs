//! The file tree the migration reads from and writes to. Paths are always relative
//! to the workspace root.

use std::{
    io,
    path::{Path, PathBuf},
};

mod disk;
mod memory;

pub use disk::DiskTree;
pub use memory::MemoryTree;

pub trait FileTree {
    /// Whether a file or a directory exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    /// Immediate children of a directory, sorted, as workspace relative paths.
    fn children(&self, directory: &Path) -> io::Result<Vec<PathBuf>>;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Writes a file, creating any missing parent directories.
    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Moves a file, creating any missing parent directories of the destination.
    fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()>;

    /// Deletes a file, or a directory along with everything under it.
    fn delete(&mut self, path: &Path) -> io::Result<()>;

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        String::from_utf8(self.read(path)?)
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))
    }

    /// Every file under a directory, recursively, sorted.
    fn files_under(&self, directory: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut directories = vec![directory.to_path_buf()];

        while let Some(directory) = directories.pop() {
            for child in self.children(&directory)? {
                if self.is_file(&child) {
                    files.push(child);
                } else {
                    directories.push(child);
                }
            }
        }

        files.sort();
        Ok(files)
    }
}
