//! Shared application state.

use std::sync::Arc;

use lustre_core::collector::{Collector, CommandRunner, CycleReport, FileSystem};
use lustre_core::metrics::Measurement;

/// Measurements and per-source outcome of one collection cycle.
pub(crate) struct Scrape {
    pub(crate) measurements: Vec<Measurement>,
    pub(crate) report: CycleReport,
}

/// Runs a blocking collection cycle. Implemented by every `Collector`.
pub(crate) trait Scraper: Send + Sync {
    fn scrape(&self) -> Scrape;
}

impl<F, R> Scraper for Collector<F, R>
where
    F: FileSystem + Clone,
    R: CommandRunner,
{
    fn scrape(&self) -> Scrape {
        let mut measurements = Vec::new();
        let report = self.collect(&mut measurements);
        Scrape {
            measurements,
            report,
        }
    }
}

pub(crate) struct ExporterState {
    pub(crate) scraper: Box<dyn Scraper>,
    /// Metric name prefix.
    pub(crate) namespace: String,
    pub(crate) telemetry_path: String,
}

pub(crate) type SharedState = Arc<ExporterState>;
