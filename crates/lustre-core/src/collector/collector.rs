//! Collection driver combining the sysfs and lctl sources.
//!
//! The `Collector` is built once from an [`ExporterConfig`] and then runs
//! any number of independent collection cycles. Sources fail independently:
//! an error stops the failing source for the rest of the cycle while the
//! other sources still run.

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::collector::catalog::{build_command_templates, build_templates};
use crate::collector::error::{CollectError, CycleError, SourceKind};
use crate::collector::lctl::{LCTL_PROGRAM, LctlMode, LctlSource};
use crate::collector::sysfs::SysfsSource;
use crate::collector::traits::{CommandRunner, FileSystem};
use crate::config::ExporterConfig;
use crate::metrics::{CountingSink, MetricSink};

/// Outcome of one source during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTiming {
    pub kind: SourceKind,
    pub duration: Duration,
    /// Number of measurements the source emitted.
    pub measurements: usize,
    /// False when the source stopped on an error.
    pub success: bool,
}

/// Summary of a collection cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub sources: Vec<SourceTiming>,
    /// Wall time of the whole cycle.
    pub total: Duration,
    pub measurements: usize,
    /// One entry per failed source, in source order.
    pub errors: Vec<CycleError>,
}

impl CycleReport {
    /// Whether every source finished without error.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A registered source of measurements.
pub enum Source<F: FileSystem, R: CommandRunner> {
    Sysfs(SysfsSource<F>),
    Lctl(LctlSource<F, R>),
}

impl<F: FileSystem, R: CommandRunner> Source<F, R> {
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Sysfs(_) => SourceKind::Sysfs,
            Source::Lctl(_) => SourceKind::Lctl,
        }
    }

    pub fn collect(&self, sink: &mut dyn MetricSink) -> Result<(), CollectError> {
        match self {
            Source::Sysfs(source) => source.collect(sink),
            Source::Lctl(source) => source.collect(sink),
        }
    }
}

/// Runs every enabled source in sequence.
///
/// Holds no per-cycle state, so one collector can serve concurrent scrapes.
pub struct Collector<F: FileSystem + Clone, R: CommandRunner> {
    sources: Vec<Source<F, R>>,
}

impl<F: FileSystem + Clone, R: CommandRunner> Collector<F, R> {
    /// Creates a collector for the templates enabled in `config`.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `runner` - Runs `lctl` in command mode
    /// * `config` - Category selections and paths
    ///
    /// In command mode the lctl source is skipped when `sudo` or `lctl`
    /// cannot be found.
    pub fn new(fs: F, runner: R, config: &ExporterConfig) -> Self {
        let mut sources = Vec::new();

        let templates = build_templates(config);
        if !templates.is_empty() {
            sources.push(Source::Sysfs(SysfsSource::new(
                fs.clone(),
                config.lustre_path(),
                templates,
            )));
        }

        let command_templates = build_command_templates(config);
        if !command_templates.is_empty() {
            let mode = if config.lctl_command_mode {
                if runner.is_available(LCTL_PROGRAM) {
                    Some(LctlMode::Command)
                } else {
                    error!(
                        "{} or sudo not found in PATH, changelog metrics disabled",
                        LCTL_PROGRAM
                    );
                    None
                }
            } else {
                Some(LctlMode::Replay {
                    root: config.lctl_replay_root.clone(),
                })
            };

            if let Some(mode) = mode {
                sources.push(Source::Lctl(LctlSource::new(
                    fs,
                    runner,
                    mode,
                    command_templates,
                )));
            }
        }

        Self { sources }
    }

    pub fn sources(&self) -> &[Source<F, R>] {
        &self.sources
    }

    /// Runs one collection cycle, streaming measurements into `sink`.
    ///
    /// The first error of a source ends that source for this cycle and is
    /// recorded in the report; the remaining sources still run. Measurements
    /// emitted before the failure are not retracted.
    pub fn collect(&self, sink: &mut dyn MetricSink) -> CycleReport {
        let total_start = Instant::now();
        let mut report = CycleReport::default();

        for source in &self.sources {
            let start = Instant::now();
            let mut counting = CountingSink::new(sink);
            let result = source.collect(&mut counting);

            let timing = SourceTiming {
                kind: source.kind(),
                duration: start.elapsed(),
                measurements: counting.count,
                success: result.is_ok(),
            };
            match result {
                Ok(()) => debug!(
                    source = %timing.kind,
                    measurements = timing.measurements,
                    elapsed_ms = timing.duration.as_millis() as u64,
                    "source collected"
                ),
                Err(error) => {
                    let error = CycleError {
                        source: timing.kind,
                        error,
                    };
                    error!(source = %error.source, error = %error.error, "source failed");
                    report.errors.push(error);
                }
            }
            report.measurements += timing.measurements;
            report.sources.push(timing);
        }

        report.total = total_start.elapsed();
        if report.is_complete() {
            info!(
                measurements = report.measurements,
                elapsed_ms = report.total.as_millis() as u64,
                "collection cycle complete"
            );
        } else {
            warn!(
                measurements = report.measurements,
                failed = report.errors.len(),
                elapsed_ms = report.total.as_millis() as u64,
                "collection cycle finished with failed sources"
            );
        }
        report
    }
}
