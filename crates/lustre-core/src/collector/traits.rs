//! Abstractions over filesystem and process access.
//!
//! Collectors read Lustre status files through [`FileSystem`] and run the
//! `lctl` control tool through [`CommandRunner`], so both can be replaced by
//! in-memory fixtures in tests.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Abstraction for filesystem operations.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists entries in a directory as full paths.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }
}

/// Failure to run an external command.
#[derive(Debug)]
pub enum CommandError {
    /// The process could not be spawned.
    Spawn(io::Error),
    /// The process exited unsuccessfully.
    Status { code: Option<i32>, stderr: String },
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Spawn(e) => write!(f, "failed to spawn: {}", e),
            CommandError::Status { code, stderr } => {
                match code {
                    Some(code) => write!(f, "exited with status {}", code)?,
                    None => write!(f, "terminated by signal")?,
                }
                if !stderr.is_empty() {
                    write!(f, ": {}", stderr)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CommandError {}

/// Runs an external program and returns its standard output.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, CommandError>;

    /// Reports whether `program` can be run at all.
    fn is_available(&self, program: &str) -> bool;
}

/// Runs commands through `sudo`, as `lctl get_param` requires root.
#[derive(Debug, Default, Clone, Copy)]
pub struct SudoRunner;

impl SudoRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SudoRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, CommandError> {
        let output = Command::new("sudo")
            .arg(program)
            .args(args)
            .output()
            .map_err(CommandError::Spawn)?;

        if !output.status.success() {
            return Err(CommandError::Status {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn is_available(&self, program: &str) -> bool {
        find_in_path("sudo").is_some() && find_in_path(program).is_some()
    }
}

/// Searches `PATH` for an executable file named `program`.
pub fn find_in_path(program: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_fs_read_to_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kbytesfree");
        std::fs::write(&path, "1024\n").unwrap();

        let fs = RealFs::new();
        assert_eq!(fs.read_to_string(&path).unwrap(), "1024\n");
    }

    #[test]
    fn test_real_fs_exists() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFs::new();
        assert!(fs.exists(dir.path()));
        assert!(!fs.exists(&dir.path().join("nonexistent")));
    }

    #[test]
    fn test_real_fs_read_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("lustre-OST0000")).unwrap();
        std::fs::write(dir.path().join("num_exports"), "3").unwrap();

        let fs = RealFs::new();
        let mut entries = fs.read_dir(dir.path()).unwrap();
        entries.sort();
        assert_eq!(
            entries,
            vec![dir.path().join("lustre-OST0000"), dir.path().join("num_exports")]
        );
    }

    #[test]
    fn test_find_in_path_missing_program() {
        assert!(find_in_path("definitely-not-an-installed-program-12345").is_none());
    }

    #[test]
    fn test_command_error_display() {
        let err = CommandError::Status {
            code: Some(2),
            stderr: "error: get_param: param_path 'mdd': No such file or directory".to_string(),
        };
        assert!(err.to_string().starts_with("exited with status 2: error"));
    }
}
