//! Collector for `lctl get_param` based templates.

use std::path::PathBuf;

use tracing::debug;

use super::parser::parse_changelogs;
use crate::collector::error::CollectError;
use crate::collector::template::CommandTemplate;
use crate::collector::traits::{CommandRunner, FileSystem};
use crate::metrics::MetricSink;

/// Lustre control tool.
pub const LCTL_PROGRAM: &str = "lctl";

/// Where `lctl` output comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum LctlMode {
    /// Run `sudo lctl get_param <param>`.
    Command,
    /// Read pre-captured output from `<root>/<param with dots as separators>`.
    Replay { root: PathBuf },
}

/// Runs command templates and parses their output.
pub struct LctlSource<F: FileSystem, R: CommandRunner> {
    fs: F,
    runner: R,
    mode: LctlMode,
    templates: Vec<CommandTemplate>,
}

impl<F: FileSystem, R: CommandRunner> LctlSource<F, R> {
    pub fn new(fs: F, runner: R, mode: LctlMode, templates: Vec<CommandTemplate>) -> Self {
        Self {
            fs,
            runner,
            mode,
            templates,
        }
    }

    pub fn templates(&self) -> &[CommandTemplate] {
        &self.templates
    }

    pub fn mode(&self) -> &LctlMode {
        &self.mode
    }

    /// Fetches the raw output for one template.
    pub fn fetch(&self, template: &CommandTemplate) -> Result<String, CollectError> {
        match &self.mode {
            LctlMode::Command => self
                .runner
                .run(LCTL_PROGRAM, &["get_param", template.param])
                .map_err(|source| CollectError::Command {
                    command: format!("sudo {} get_param {}", LCTL_PROGRAM, template.param),
                    source,
                }),
            LctlMode::Replay { root } => {
                let path = root.join(template.replay_path());
                self.fs
                    .read_to_string(&path)
                    .map_err(|source| CollectError::Io { path, source })
            }
        }
    }

    /// Runs every template and streams its measurements into `sink`.
    pub fn collect(&self, sink: &mut dyn MetricSink) -> Result<(), CollectError> {
        for template in &self.templates {
            let output = self.fetch(template)?;
            let records = parse_changelogs(&output)?;
            debug!(
                param = template.param,
                targets = records.len(),
                "parsed changelog users"
            );
            for record in &records {
                for measurement in record.measurements() {
                    sink.emit(measurement);
                }
            }
        }
        Ok(())
    }
}
