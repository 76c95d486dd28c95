//! Prometheus text exposition format renderer.

use std::collections::HashMap;
use std::fmt::Write;

use super::{Measurement, MetricKind};
use crate::collector::{CycleReport, SourceTiming};

/// Renders measurements in Prometheus text format (0.0.4).
///
/// Names are prefixed with `namespace` when it is non-empty. Samples sharing a
/// name are grouped under a single `# HELP`/`# TYPE` header; families keep the
/// order in which their first sample was emitted.
pub fn render_metrics(namespace: &str, measurements: &[Measurement]) -> String {
    let mut order: Vec<&str> = Vec::new();
    let mut families: HashMap<&str, Vec<&Measurement>> = HashMap::new();

    for m in measurements {
        families
            .entry(m.name.as_str())
            .or_insert_with(|| {
                order.push(m.name.as_str());
                Vec::new()
            })
            .push(m);
    }

    let mut output = String::new();
    for name in order {
        let samples = &families[name];
        let first = samples[0];
        let fq_name = qualified_name(namespace, name);

        let _ = writeln!(output, "# HELP {} {}", fq_name, escape_help(&first.help));
        let _ = writeln!(output, "# TYPE {} {}", fq_name, first.kind.as_str());

        for m in samples {
            write_sample(&mut output, &fq_name, &m.labels, m.value);
        }
    }

    output
}

/// Renders the exporter's own per-source scrape timings and outcomes.
pub fn render_scrape_report(namespace: &str, report: &CycleReport) -> String {
    let mut output = String::new();

    let families: [(&str, &str, fn(&SourceTiming) -> f64); 2] = [
        (
            "exporter_scrape_duration_seconds",
            "Time spent collecting each source during the last scrape.",
            |source| source.duration.as_secs_f64(),
        ),
        (
            "exporter_scrape_collector_success",
            "Whether each source succeeded during the last scrape.",
            |source| if source.success { 1.0 } else { 0.0 },
        ),
    ];

    for (name, help, value) in families {
        let fq_name = qualified_name(namespace, name);
        let _ = writeln!(output, "# HELP {} {}", fq_name, help);
        let _ = writeln!(output, "# TYPE {} {}", fq_name, MetricKind::Gauge.as_str());
        for source in &report.sources {
            let labels = [("source".to_string(), source.kind.as_str().to_string())];
            write_sample(&mut output, &fq_name, &labels, value(source));
        }
    }

    output
}

fn qualified_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}_{}", namespace, name)
    }
}

fn write_sample(output: &mut String, name: &str, labels: &[(String, String)], value: f64) {
    if labels.is_empty() {
        let _ = writeln!(output, "{} {}", name, format_value(value));
    } else {
        let labels: Vec<String> = labels
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
            .collect();
        let _ = writeln!(
            output,
            "{}{{{}}} {}",
            name,
            labels.join(","),
            format_value(value)
        );
    }
}

fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn escape_help(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\n', "\\n")
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v.is_sign_positive() { "+Inf" } else { "-Inf" }.to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.0}", v)
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::SourceKind;
    use std::time::Duration;

    fn gauge(name: &str, target: &str, value: f64) -> Measurement {
        Measurement::new(name, MetricKind::Gauge, "Filesystem block size in bytes", value)
            .with_base_labels("ost", target)
    }

    #[test]
    fn test_render_with_namespace() {
        let output = render_metrics("lustre", &[gauge("blocksize_bytes", "lustre-OST0000", 4096.0)]);

        assert!(output.contains("# HELP lustre_blocksize_bytes Filesystem block size in bytes\n"));
        assert!(output.contains("# TYPE lustre_blocksize_bytes gauge\n"));
        assert!(output.contains(
            "lustre_blocksize_bytes{component=\"ost\",target=\"lustre-OST0000\"} 4096\n"
        ));
    }

    #[test]
    fn test_render_groups_interleaved_families() {
        let metrics = vec![
            gauge("blocksize_bytes", "lustre-OST0000", 4096.0),
            gauge("inodes_free", "lustre-OST0000", 10.0),
            gauge("blocksize_bytes", "lustre-OST0001", 4096.0),
        ];
        let output = render_metrics("", &metrics);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(output.matches("# TYPE blocksize_bytes").count(), 1);
        assert!(lines[2].contains("lustre-OST0000"));
        assert!(lines[3].contains("lustre-OST0001"));
        assert!(lines[4].starts_with("# HELP inodes_free"));
    }

    #[test]
    fn test_render_fractional_value() {
        let output = render_metrics("", &[gauge("grant_rate", "x", 0.25)]);
        assert!(output.contains("} 0.25\n"));
    }

    #[test]
    fn test_escape_label_value() {
        assert_eq!(escape_label_value("a\\b"), "a\\\\b");
        assert_eq!(escape_label_value("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_label_value("l1\nl2"), "l1\\nl2");
    }

    #[test]
    fn test_render_scrape_report() {
        let report = CycleReport {
            sources: vec![
                SourceTiming {
                    kind: SourceKind::Sysfs,
                    duration: Duration::from_millis(250),
                    measurements: 3,
                    success: true,
                },
                SourceTiming {
                    kind: SourceKind::Lctl,
                    duration: Duration::from_millis(5),
                    measurements: 0,
                    success: false,
                },
            ],
            total: Duration::from_millis(255),
            measurements: 3,
            errors: Vec::new(),
        };
        let output = render_scrape_report("lustre", &report);
        assert!(output.contains("lustre_exporter_scrape_duration_seconds{source=\"sysfs\"} 0.25\n"));
        assert!(output.contains("# TYPE lustre_exporter_scrape_collector_success gauge\n"));
        assert!(output.contains("lustre_exporter_scrape_collector_success{source=\"sysfs\"} 1\n"));
        assert!(output.contains("lustre_exporter_scrape_collector_success{source=\"lctl\"} 0\n"));
    }
}
