//! Error types for collection failures.

use std::io;
use std::path::PathBuf;

use crate::collector::lctl::ChangelogError;
use crate::collector::traits::CommandError;

/// A fatal failure while collecting one source.
///
/// Every variant ends the failing source for the current collection cycle.
#[derive(Debug)]
pub enum CollectError {
    /// A template produced a glob expression that cannot be compiled.
    Pattern { pattern: String, message: String },
    /// A resolved path is too short to hold the node identifier.
    MalformedLayout { path: PathBuf, depth: usize },
    /// A matched file could not be read.
    Io { path: PathBuf, source: io::Error },
    /// The control tool could not be run or failed.
    Command { command: String, source: CommandError },
    /// Command output lacks the target or current-index anchor.
    MissingAnchor(ChangelogError),
    /// A field expected to be numeric did not parse.
    MalformedValue { context: String, message: String },
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Pattern { pattern, message } => {
                write!(f, "invalid glob pattern '{}': {}", pattern, message)
            }
            CollectError::MalformedLayout { path, depth } => write!(
                f,
                "path {} has too few components for directory depth {}",
                path.display(),
                depth
            ),
            CollectError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            CollectError::Command { command, source } => {
                write!(f, "command '{}' failed: {}", command, source)
            }
            CollectError::MissingAnchor(e) => write!(f, "{}", e),
            CollectError::MalformedValue { context, message } => {
                write!(f, "malformed value in {}: {}", context, message)
            }
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Io { source, .. } => Some(source),
            CollectError::Command { source, .. } => Some(source),
            CollectError::MissingAnchor(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ChangelogError> for CollectError {
    fn from(e: ChangelogError) -> Self {
        match e {
            ChangelogError::InvalidNumber { .. } => CollectError::MalformedValue {
                context: "changelog_users".to_string(),
                message: e.to_string(),
            },
            e => CollectError::MissingAnchor(e),
        }
    }
}

/// Identifies which source variant a cycle error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Sysfs,
    Lctl,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Sysfs => "sysfs",
            SourceKind::Lctl => "lctl",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source failure within a collection cycle, tagged with the source.
#[derive(Debug)]
pub struct CycleError {
    pub source: SourceKind,
    pub error: CollectError,
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} source failed: {}", self.source, self.error)
    }
}

impl std::error::Error for CycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
