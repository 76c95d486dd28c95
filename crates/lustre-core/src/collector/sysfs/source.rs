//! Collector for file-based templates under `<sys>/fs/lustre`.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::parser::{self, ParseError};
use crate::collector::error::CollectError;
use crate::collector::resolver::{ResolvedTarget, resolve};
use crate::collector::template::{Strategy, Template};
use crate::collector::traits::FileSystem;
use crate::metrics::{Measurement, MetricSink};

/// Reads Lustre status files described by a list of templates.
pub struct SysfsSource<F: FileSystem> {
    fs: F,
    base_path: PathBuf,
    templates: Vec<Template>,
}

impl<F: FileSystem> SysfsSource<F> {
    /// Creates a new sysfs source.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `base_path` - Lustre root, usually `/sys/fs/lustre`
    /// * `templates` - Enabled templates, see [`crate::collector::catalog`]
    pub fn new(fs: F, base_path: impl Into<PathBuf>, templates: Vec<Template>) -> Self {
        Self {
            fs,
            base_path: base_path.into(),
            templates,
        }
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolves every template and streams its measurements into `sink`.
    ///
    /// Stops at the first error; measurements already emitted stay emitted.
    pub fn collect(&self, sink: &mut dyn MetricSink) -> Result<(), CollectError> {
        for template in &self.templates {
            let targets = resolve(&self.fs, &self.base_path, template)?;
            if targets.is_empty() {
                trace!(
                    pattern = template.path_pattern,
                    file = template.filename,
                    "no matches"
                );
                continue;
            }

            for target in &targets {
                debug!(path = %target.path.display(), metric = template.metric_name, "parsing");
                for measurement in self.parse_target(target)? {
                    sink.emit(measurement);
                }
            }
        }
        Ok(())
    }

    /// Reads and parses one resolved file.
    pub fn parse_target(&self, target: &ResolvedTarget<'_>) -> Result<Vec<Measurement>, CollectError> {
        let template = target.template;
        let content = self
            .fs
            .read_to_string(&target.path)
            .map_err(|source| CollectError::Io {
                path: target.path.clone(),
                source,
            })?;
        let component = template.component.as_str();

        let measurement = |name: &str, help: &str, kind, value| {
            Measurement::new(name, kind, help, value).with_base_labels(component, &target.node)
        };

        match template.strategy {
            Strategy::Health => Ok(vec![measurement(
                template.metric_name,
                template.help_text,
                template.kind,
                parser::parse_health(&content),
            )]),
            Strategy::Scalar => {
                let value = parser::parse_scalar(&content)
                    .map_err(|e| malformed(&target.path, e))?;
                Ok(vec![measurement(
                    template.metric_name,
                    template.help_text,
                    template.kind,
                    value,
                )])
            }
            Strategy::Stats => {
                let samples = parser::parse_stats(
                    &content,
                    template.metric_name,
                    template.help_text,
                    template.kind,
                    template.has_multiple_values,
                )
                .map_err(|e| malformed(&target.path, e))?;

                Ok(samples
                    .into_iter()
                    .filter(|sample| template.with_extremes || !sample.extreme)
                    .map(|sample| {
                        let m = measurement(&sample.name, &sample.help, sample.kind, sample.value);
                        match sample.extra_label {
                            Some((label, value)) => m.with_label(label, value),
                            None => m,
                        }
                    })
                    .collect())
            }
        }
    }
}

fn malformed(path: &Path, e: ParseError) -> CollectError {
    CollectError::MalformedValue {
        context: path.display().to_string(),
        message: e.message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use crate::collector::catalog::build_templates;
    use crate::config::{ExporterConfig, Selection};
    use crate::metrics::MetricKind;

    const BASE: &str = "/sys/fs/lustre";

    fn source(fs: MockFs, config: &ExporterConfig) -> SysfsSource<MockFs> {
        SysfsSource::new(fs, BASE, build_templates(config))
    }

    fn only_health() -> ExporterConfig {
        ExporterConfig {
            ost: Selection::Disabled,
            mdt: Selection::Disabled,
            mgs: Selection::Disabled,
            client: Selection::Disabled,
            ..ExporterConfig::default()
        }
    }

    #[test]
    fn test_collect_health_fail_open() {
        let mut fs = MockFs::new();
        fs.add_file(format!("{BASE}/health_check"), "NOT HEALTHY\n");

        let mut out: Vec<Measurement> = Vec::new();
        source(fs, &only_health()).collect(&mut out).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "health_check");
        assert_eq!(out[0].value, 0.0);
        assert_eq!(out[0].label("component"), Some("health"));
        assert_eq!(out[0].label("target"), Some("lustre"));
    }

    #[test]
    fn test_collect_empty_tree() {
        let mut out: Vec<Measurement> = Vec::new();
        source(MockFs::new(), &ExporterConfig::default())
            .collect(&mut out)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_collect_bad_scalar_aborts() {
        let mut fs = MockFs::new();
        fs.add_file(format!("{BASE}/obdfilter/lustre-OST0000/degraded"), "0\n");
        fs.add_file(format!("{BASE}/obdfilter/lustre-OST0000/num_exports"), "n/a\n");

        let config = ExporterConfig {
            health: Selection::Disabled,
            ost: Selection::Core,
            mdt: Selection::Disabled,
            mgs: Selection::Disabled,
            client: Selection::Disabled,
            ..ExporterConfig::default()
        };

        let mut out: Vec<Measurement> = Vec::new();
        let err = source(fs, &config).collect(&mut out).unwrap_err();

        assert!(matches!(err, CollectError::MalformedValue { .. }));
        // degraded precedes num_exports in the catalog and was already streamed
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "degraded");
    }

    #[test]
    fn test_parse_target_stats_fan_out() {
        let mut fs = MockFs::new();
        fs.add_file(
            format!("{BASE}/llite/lustre-ffff8800/stats"),
            "snapshot_time 1 secs.usecs\nopen 4 samples [reqs]\nclose 3 samples [reqs]\n",
        );
        let config = ExporterConfig {
            client: Selection::Core,
            ..only_health()
        };
        let src = source(fs, &config);
        let template = src
            .templates()
            .iter()
            .find(|t| t.metric_name == "stats_total")
            .unwrap();
        let targets = resolve(&src.fs, src.base_path(), template).unwrap();
        let measurements = src.parse_target(&targets[0]).unwrap();

        assert_eq!(measurements.len(), 2);
        for m in &measurements {
            assert_eq!(m.kind, MetricKind::Counter);
            assert_eq!(
                m.label_names().collect::<Vec<_>>(),
                vec!["component", "target", "operation"]
            );
            assert_eq!(m.label("target"), Some("lustre-ffff8800"));
        }
        assert_eq!(measurements[1].label("operation"), Some("close"));
    }

    #[test]
    fn test_core_client_stats_skip_extremes() {
        let stats = "snapshot_time 1 secs.usecs\n\
                     read_bytes 17 samples [bytes] 4096 1048576 11111111\n\
                     write_bytes 9 samples [bytes] 4096 1048576 7777777\n";
        let names = |selection: Selection| {
            let mut fs = MockFs::new();
            fs.add_file(format!("{BASE}/llite/lustre-ffff8800/stats"), stats);
            let config = ExporterConfig {
                health: Selection::Disabled,
                client: selection,
                ..only_health()
            };
            let mut out: Vec<Measurement> = Vec::new();
            source(fs, &config).collect(&mut out).unwrap();
            out.into_iter()
                .filter(|m| m.name.starts_with("read_") || m.name.starts_with("write_"))
                .map(|m| m.name)
                .collect::<Vec<_>>()
        };

        assert_eq!(
            names(Selection::Core),
            vec![
                "read_samples_total",
                "read_bytes_total",
                "write_samples_total",
                "write_bytes_total",
            ]
        );
        assert_eq!(
            names(Selection::Extended),
            vec![
                "read_samples_total",
                "read_minimum_size_bytes",
                "read_maximum_size_bytes",
                "read_bytes_total",
                "write_samples_total",
                "write_minimum_size_bytes",
                "write_maximum_size_bytes",
                "write_bytes_total",
            ]
        );
    }
}
