//! Exporter configuration.
//!
//! A single immutable value built at startup and threaded into collector
//! construction. Nothing here is consulted during a collection cycle.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

/// Collection level for one category of templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    /// No templates of this category are collected.
    Disabled,
    /// Only core-tier templates are collected.
    Core,
    /// Core and extended tiers are collected.
    #[default]
    Extended,
}

impl Selection {
    pub fn as_str(self) -> &'static str {
        match self {
            Selection::Disabled => "disabled",
            Selection::Core => "core",
            Selection::Extended => "extended",
        }
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized selection string.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionParseError(pub String);

impl std::fmt::Display for SelectionParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid collector selection '{}' (expected disabled, core or extended)",
            self.0
        )
    }
}

impl std::error::Error for SelectionParseError {}

impl FromStr for Selection {
    type Err = SelectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" => Ok(Selection::Disabled),
            "core" => Ok(Selection::Core),
            "extended" => Ok(Selection::Extended),
            _ => Err(SelectionParseError(s.to_string())),
        }
    }
}

/// Runtime configuration for the collector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExporterConfig {
    pub health: Selection,
    pub ost: Selection,
    pub mdt: Selection,
    pub mgs: Selection,
    pub client: Selection,
    /// Root of sysfs; Lustre files live under `<sys_path>/fs/lustre`.
    pub sys_path: PathBuf,
    /// Run `sudo lctl get_param` instead of reading pre-captured output.
    pub lctl_command_mode: bool,
    /// Root directory of pre-captured `lctl` output (file-replay mode).
    pub lctl_replay_root: PathBuf,
    /// Prefix for exposed metric names.
    pub namespace: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            health: Selection::Extended,
            ost: Selection::Extended,
            mdt: Selection::Extended,
            mgs: Selection::Extended,
            client: Selection::Extended,
            sys_path: PathBuf::from("/sys"),
            lctl_command_mode: true,
            lctl_replay_root: PathBuf::from("lctl"),
            namespace: "lustre".to_string(),
        }
    }
}

impl ExporterConfig {
    /// Base directory that sysfs templates are resolved against.
    pub fn lustre_path(&self) -> PathBuf {
        self.sys_path.join("fs").join("lustre")
    }
}
