//! Measurement model and text exposition.
//!
//! A [`Measurement`] is the wire-ready unit produced by every collector:
//! a metric name, help text, kind, an ordered label set and a value.
//! Sinks implementing [`MetricSink`] receive measurements as they are produced.

mod format;

use serde::Serialize;

pub use format::{render_metrics, render_scrape_report};

/// Label name carrying the subsystem tag (`mdt`, `ost`, `mgs`, `client`, `health`).
pub const COMPONENT_LABEL: &str = "component";
/// Label name carrying the node identifier.
pub const TARGET_LABEL: &str = "target";

/// Prometheus metric kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when a measurement would violate its label invariants.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricError {
    /// Label names and values differ in length.
    LabelCountMismatch { names: usize, values: usize },
    /// The same label name appears twice.
    DuplicateLabel(String),
}

impl std::fmt::Display for MetricError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricError::LabelCountMismatch { names, values } => write!(
                f,
                "label count mismatch: {} names, {} values",
                names, values
            ),
            MetricError::DuplicateLabel(name) => write!(f, "duplicate label '{}'", name),
        }
    }
}

impl std::error::Error for MetricError {}

/// A single labeled sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    /// Ordered `(name, value)` pairs.
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

impl Measurement {
    /// Creates a measurement without labels.
    pub fn new(
        name: impl Into<String>,
        kind: MetricKind,
        help: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            kind,
            labels: Vec::new(),
            value,
        }
    }

    /// Builds a measurement from parallel label name/value slices.
    ///
    /// Fails if the slices differ in length or a name repeats.
    pub fn from_parts(
        label_names: &[&str],
        label_values: &[&str],
        name: impl Into<String>,
        help: impl Into<String>,
        kind: MetricKind,
        value: f64,
    ) -> Result<Self, MetricError> {
        if label_names.len() != label_values.len() {
            return Err(MetricError::LabelCountMismatch {
                names: label_names.len(),
                values: label_values.len(),
            });
        }

        let mut measurement = Self::new(name, kind, help, value);
        for (label, value) in label_names.iter().zip(label_values) {
            measurement.push_label(*label, *value)?;
        }
        Ok(measurement)
    }

    /// Appends a label pair, rejecting a name that is already present.
    pub fn push_label(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), MetricError> {
        let name = name.into();
        if self.labels.iter().any(|(existing, _)| *existing == name) {
            return Err(MetricError::DuplicateLabel(name));
        }
        self.labels.push((name, value.into()));
        Ok(())
    }

    /// Appends a label pair whose name is known not to be present yet.
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        debug_assert!(self.labels.iter().all(|(existing, _)| *existing != name));
        self.labels.push((name, value.into()));
        self
    }

    /// Adds the `component` and `target` base labels.
    ///
    /// Only valid on a label-less measurement; later labels follow the base pair.
    pub fn with_base_labels(mut self, component: &str, target: &str) -> Self {
        debug_assert!(self.labels.is_empty());
        self.labels
            .push((COMPONENT_LABEL.to_string(), component.to_string()));
        self.labels.push((TARGET_LABEL.to_string(), target.to_string()));
        self
    }

    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|(name, _)| name.as_str())
    }

    pub fn label_values(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|(_, value)| value.as_str())
    }

    /// Looks up a label value by name.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(label, _)| label == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Receiver of measurements produced during a collection cycle.
pub trait MetricSink {
    fn emit(&mut self, measurement: Measurement);
}

impl MetricSink for Vec<Measurement> {
    fn emit(&mut self, measurement: Measurement) {
        self.push(measurement);
    }
}

/// Sink adapter that counts what passes through it.
pub(crate) struct CountingSink<'a> {
    inner: &'a mut dyn MetricSink,
    pub(crate) count: usize,
}

impl<'a> CountingSink<'a> {
    pub(crate) fn new(inner: &'a mut dyn MetricSink) -> Self {
        Self { inner, count: 0 }
    }
}

impl MetricSink for CountingSink<'_> {
    fn emit(&mut self, measurement: Measurement) {
        self.count += 1;
        self.inner.emit(measurement);
    }
}
