//! `lctl` command output: changelog consumer state of metadata targets.

pub mod parser;
mod source;

pub use parser::{ChangelogError, ChangelogRecord, ChangelogUser, parse_changelog, parse_changelogs};
pub use source::{LCTL_PROGRAM, LctlMode, LctlSource};
