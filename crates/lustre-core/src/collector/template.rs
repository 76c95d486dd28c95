//! Declarative scrape templates.
//!
//! A [`Template`] describes where a value lives (glob path plus file name),
//! how to parse it and how the resulting measurement is named.

use serde::Serialize;

use crate::config::Selection;
use crate::metrics::MetricKind;

/// Subsystem a template belongs to; also the `component` label value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Health,
    Ost,
    Mdt,
    Mgs,
    Client,
}

impl Component {
    pub fn as_str(self) -> &'static str {
        match self {
            Component::Health => "health",
            Component::Ost => "ost",
            Component::Mdt => "mdt",
            Component::Mgs => "mgs",
            Component::Client => "client",
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority tier of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Core,
    Extended,
}

impl Tier {
    /// Whether a template of this tier is active under `selection`.
    pub fn is_selected(self, selection: Selection) -> bool {
        match selection {
            Selection::Disabled => false,
            Selection::Core => self == Tier::Core,
            Selection::Extended => true,
        }
    }
}

/// How the content of a matched file is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Single numeric literal.
    Scalar,
    /// `healthy` token mapped to 1, anything else to 0.
    Health,
    /// Multi-row stats table.
    Stats,
}

/// Immutable description of one scrape target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    pub component: Component,
    /// Glob relative to the base directory; may be empty.
    pub path_pattern: &'static str,
    /// Leaf file name, possibly with sub-directories (`pool/granted`).
    pub filename: &'static str,
    pub metric_name: &'static str,
    pub help_text: &'static str,
    pub kind: MetricKind,
    pub strategy: Strategy,
    pub has_multiple_values: bool,
    /// Emit the minimum and maximum gauges of a single-value stats row.
    pub with_extremes: bool,
    pub tier: Tier,
}

impl Template {
    /// Number of directories between the node directory and the leaf file.
    pub fn directory_depth(&self) -> usize {
        self.filename.matches('/').count()
    }

    /// Full glob relative to the base directory, split into non-empty segments.
    pub fn pattern_segments(&self) -> Vec<&'static str> {
        self.path_pattern
            .split('/')
            .chain(self.filename.split('/'))
            .filter(|segment| !segment.is_empty())
            .collect()
    }
}

/// A command-based template (`lctl get_param <param>`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandTemplate {
    pub component: Component,
    /// Parameter name passed to `lctl get_param`.
    pub param: &'static str,
    pub tier: Tier,
}

impl CommandTemplate {
    /// Relative file path used in replay mode: dots become path separators.
    pub fn replay_path(&self) -> std::path::PathBuf {
        self.param.split('.').collect()
    }
}
