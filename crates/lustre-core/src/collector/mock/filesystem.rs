//! In-memory mock filesystem for testing collectors without a Lustre node.
//!
//! `MockFs` simulates a sysfs tree in memory, so collector tests run on
//! any machine and in CI.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content. Parent directories are created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    fn add_parents(&mut self, path: &Path) {
        for parent in path.ancestors().skip(1) {
            if !parent.as_os_str().is_empty() {
                self.directories.insert(parent.to_path_buf());
            }
        }
    }

    /// Adds a set of files below one target directory.
    ///
    /// # Arguments
    /// * `dir` - Target directory, e.g. `/sys/fs/lustre/obdfilter/lustre-OST0000`
    /// * `files` - `(relative name, content)` pairs; names may contain `/`
    pub fn add_target(&mut self, dir: impl AsRef<Path>, files: &[(&str, &str)]) {
        let dir = dir.as_ref();
        self.add_dir(dir);
        for (name, content) in files {
            self.add_file(dir.join(name), *content);
        }
    }

    /// Loads a mock filesystem from a directory snapshot, mounted at `root`.
    ///
    /// Useful for regression tests against a captured `/sys/fs/lustre` tree.
    pub fn from_snapshot(dir: &Path, root: &Path) -> io::Result<Self> {
        let mut fs = Self::new();
        load_directory_recursive(&mut fs, dir, root)?;
        Ok(fs)
    }
}

fn load_directory_recursive(
    fs: &mut MockFs,
    real_path: &Path,
    virtual_path: &Path,
) -> io::Result<()> {
    fs.add_dir(virtual_path);

    for entry in std::fs::read_dir(real_path)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let virtual_child = virtual_path.join(entry.file_name());

        if file_type.is_dir() {
            load_directory_recursive(fs, &entry.path(), &virtual_child)?;
        } else if file_type.is_file() {
            // Skip binary files
            if let Ok(content) = std::fs::read_to_string(entry.path()) {
                fs.add_file(&virtual_child, content);
            }
        }
    }
    Ok(())
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let children = self
            .files
            .keys()
            .chain(self.directories.iter())
            .filter(|child| child.parent() == Some(path) && child.as_path() != path)
            .cloned()
            .collect::<HashSet<_>>();

        Ok(children.into_iter().collect())
    }
}
