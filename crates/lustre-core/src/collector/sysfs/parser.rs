//! Parsers for Lustre sysfs/procfs files.
//!
//! These are pure functions over file content, testable with string inputs.

use crate::metrics::MetricKind;

/// Token written to `health_check` by a healthy instance.
pub const HEALTHY: &str = "healthy";

/// Label naming the row of a fanned-out stats table.
pub const OPERATION_LABEL: &str = "operation";

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parses a file holding one numeric literal.
pub fn parse_scalar(content: &str) -> Result<f64, ParseError> {
    let trimmed = content.trim();
    trimmed
        .parse()
        .map_err(|_| ParseError::new(format!("invalid number '{}'", trimmed)))
}

/// Maps `health_check` content to 1 (healthy) or 0 (anything else).
pub fn parse_health(content: &str) -> f64 {
    if content.trim() == HEALTHY { 1.0 } else { 0.0 }
}

/// One row of a stats table.
///
/// Format: `name count samples [unit] [min max sum [sumsq]]`
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRow {
    pub name: String,
    pub count: f64,
    pub unit: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub total: Option<f64>,
}

/// Parses one stats line.
///
/// Returns `Ok(None)` for lines that are not sample rows (headers such as
/// `snapshot_time`, blank lines). A sample row with a non-numeric field is
/// an error.
pub fn parse_stats_row(line: &str) -> Result<Option<StatsRow>, ParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 || fields[2] != "samples" {
        return Ok(None);
    }

    let name = fields[0];
    let number = |idx: usize, what: &str| -> Result<Option<f64>, ParseError> {
        fields
            .get(idx)
            .map(|raw| {
                raw.parse().map_err(|_| {
                    ParseError::new(format!("invalid {} '{}' in row '{}'", what, raw, name))
                })
            })
            .transpose()
    };

    let count = number(1, "sample count")?.unwrap_or_default();

    let unit = fields
        .get(3)
        .and_then(|f| f.strip_prefix('['))
        .and_then(|f| f.strip_suffix(']'))
        .map(str::to_string);

    // Magnitudes only follow a unit annotation.
    let (min, max, total) = if unit.is_some() {
        (number(4, "minimum")?, number(5, "maximum")?, number(6, "sum")?)
    } else {
        (None, None, None)
    };

    Ok(Some(StatsRow {
        name: name.to_string(),
        count,
        unit,
        min,
        max,
        total,
    }))
}

/// Parses every sample row of a stats file.
pub fn parse_stats_rows(content: &str) -> Result<Vec<StatsRow>, ParseError> {
    let mut rows = Vec::new();
    for line in content.lines() {
        if let Some(row) = parse_stats_row(line)? {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// A value derived from a stats row, before base labels are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSample {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub value: f64,
    /// Extra `(label, value)` pair for fanned-out rows.
    pub extra_label: Option<(String, String)>,
    /// Minimum or maximum of a single-value row.
    pub extreme: bool,
}

/// Converts a stats file into samples for one template.
///
/// With `has_multiple_values`, every row becomes one `metric_name` sample
/// labeled with its operation. Otherwise only the row named
/// `<metric_name>_bytes` (or `<metric_name>`) is used: one sample-count
/// counter plus a gauge for each magnitude field present.
pub fn parse_stats(
    content: &str,
    metric_name: &str,
    help_text: &str,
    kind: MetricKind,
    has_multiple_values: bool,
) -> Result<Vec<StatsSample>, ParseError> {
    let rows = parse_stats_rows(content)?;

    if has_multiple_values {
        return Ok(rows
            .into_iter()
            .map(|row| StatsSample {
                name: metric_name.to_string(),
                help: help_text.to_string(),
                kind,
                value: row.count,
                extra_label: Some((OPERATION_LABEL.to_string(), row.name)),
                extreme: false,
            })
            .collect());
    }

    let bytes_row = format!("{}_bytes", metric_name);
    let Some(row) = rows
        .into_iter()
        .find(|row| row.name == bytes_row || row.name == metric_name)
    else {
        return Ok(Vec::new());
    };

    Ok(io_samples(&row, metric_name, help_text))
}

fn io_samples(row: &StatsRow, metric_name: &str, help_text: &str) -> Vec<StatsSample> {
    let sample = |suffix: String, help: String, kind: MetricKind, value: f64| StatsSample {
        name: format!("{}_{}", metric_name, suffix),
        help: format!("{}: {}", help_text, help),
        kind,
        value,
        extra_label: None,
        extreme: false,
    };

    let mut samples = vec![sample(
        "samples_total".to_string(),
        "total number of samples".to_string(),
        MetricKind::Counter,
        row.count,
    )];

    let unit = row.unit.as_deref().unwrap_or("units");
    let (min_suffix, max_suffix, total_suffix) = if unit == "bytes" {
        (
            "minimum_size_bytes".to_string(),
            "maximum_size_bytes".to_string(),
            "bytes_total".to_string(),
        )
    } else {
        (
            format!("minimum_{}", unit),
            format!("maximum_{}", unit),
            format!("{}_total", unit),
        )
    };

    if let Some(min) = row.min {
        samples.push(StatsSample {
            extreme: true,
            ..sample(
                min_suffix,
                format!("minimum {} in a single sample", unit),
                MetricKind::Gauge,
                min,
            )
        });
    }
    if let Some(max) = row.max {
        samples.push(StatsSample {
            extreme: true,
            ..sample(
                max_suffix,
                format!("maximum {} in a single sample", unit),
                MetricKind::Gauge,
                max,
            )
        });
    }
    if let Some(total) = row.total {
        samples.push(sample(
            total_suffix,
            format!("total {} across all samples", unit),
            MetricKind::Gauge,
            total,
        ));
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT_STATS: &str = "\
snapshot_time             1499977591.123456789 secs.nsecs
read_bytes                17 samples [bytes] 4096 1048576 11111111 12345678901234
write_bytes               9 samples [bytes] 4096 1048576 7777777 98765432101234
open                      4 samples [reqs]
close                     3 samples [reqs]
getattr                   12 samples [reqs]
";

    #[test]
    fn test_parse_scalar() {
        assert_eq!(parse_scalar("4096\n").unwrap(), 4096.0);
        assert_eq!(parse_scalar("  0.25 ").unwrap(), 0.25);
        assert!(parse_scalar("not a number").is_err());
        assert!(parse_scalar("").is_err());
    }

    #[test]
    fn test_parse_health() {
        assert_eq!(parse_health("healthy\n"), 1.0);
        assert_eq!(parse_health("NOT HEALTHY"), 0.0);
        assert_eq!(parse_health("LBUG"), 0.0);
        assert_eq!(parse_health(""), 0.0);
    }

    #[test]
    fn test_parse_stats_row_shapes() {
        let row = parse_stats_row("read_bytes 17 samples [bytes] 4096 1048576 11111111")
            .unwrap()
            .unwrap();
        assert_eq!(row.name, "read_bytes");
        assert_eq!(row.count, 17.0);
        assert_eq!(row.unit.as_deref(), Some("bytes"));
        assert_eq!(row.min, Some(4096.0));
        assert_eq!(row.max, Some(1048576.0));
        assert_eq!(row.total, Some(11111111.0));

        let row = parse_stats_row("open 4 samples [reqs]").unwrap().unwrap();
        assert_eq!(row.count, 4.0);
        assert_eq!(row.min, None);

        assert_eq!(
            parse_stats_row("snapshot_time 1499977591.123 secs.nsecs").unwrap(),
            None
        );
        assert_eq!(parse_stats_row("").unwrap(), None);
    }

    #[test]
    fn test_parse_stats_row_bad_number() {
        let err = parse_stats_row("read_bytes x17 samples [bytes]").unwrap_err();
        assert!(err.message.contains("sample count"));

        let err = parse_stats_row("read_bytes 17 samples [bytes] 4096 big 1").unwrap_err();
        assert!(err.message.contains("maximum"));
    }

    #[test]
    fn test_parse_stats_single_value() {
        let samples = parse_stats(
            CLIENT_STATS,
            "read",
            "Client read operations",
            MetricKind::Counter,
            false,
        )
        .unwrap();

        let names: Vec<&str> = samples.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "read_samples_total",
                "read_minimum_size_bytes",
                "read_maximum_size_bytes",
                "read_bytes_total",
            ]
        );
        assert_eq!(samples[0].kind, MetricKind::Counter);
        assert!(samples[1..].iter().all(|s| s.kind == MetricKind::Gauge));
        assert_eq!(samples[0].value, 17.0);
        assert_eq!(samples[3].value, 11111111.0);
        assert!(samples.iter().all(|s| s.extra_label.is_none()));
        let extremes: Vec<bool> = samples.iter().map(|s| s.extreme).collect();
        assert_eq!(extremes, vec![false, true, true, false]);
    }

    #[test]
    fn test_parse_stats_single_value_non_byte_unit() {
        let content = "ping 5 samples [usecs] 10 90 200\n";
        let samples = parse_stats(content, "ping", "Pings", MetricKind::Counter, false).unwrap();
        let names: Vec<&str> = samples.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "ping_samples_total",
                "ping_minimum_usecs",
                "ping_maximum_usecs",
                "ping_usecs_total",
            ]
        );
    }

    #[test]
    fn test_parse_stats_count_only_row() {
        let samples = parse_stats(CLIENT_STATS, "open", "Opens", MetricKind::Counter, false).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].name, "open_samples_total");
        assert_eq!(samples[0].value, 4.0);
    }

    #[test]
    fn test_parse_stats_multiple_values() {
        let samples = parse_stats(
            CLIENT_STATS,
            "stats_total",
            "Number of operations the filesystem has performed",
            MetricKind::Counter,
            true,
        )
        .unwrap();

        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(|s| s.name == "stats_total"));
        let ops: Vec<&str> = samples
            .iter()
            .map(|s| s.extra_label.as_ref().unwrap().1.as_str())
            .collect();
        assert_eq!(ops, vec!["read_bytes", "write_bytes", "open", "close", "getattr"]);
        assert_eq!(samples[4].value, 12.0);
    }

    #[test]
    fn test_parse_stats_unrecognized_rows_ignored() {
        let content = "snapshot_time 1 secs.usecs\ngarbage line here\n";
        assert!(
            parse_stats(content, "read", "h", MetricKind::Counter, false)
                .unwrap()
                .is_empty()
        );
        assert!(
            parse_stats(content, "stats_total", "h", MetricKind::Counter, true)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_parse_stats_is_deterministic() {
        let a = parse_stats(CLIENT_STATS, "write", "h", MetricKind::Counter, false).unwrap();
        let b = parse_stats(CLIENT_STATS, "write", "h", MetricKind::Counter, false).unwrap();
        assert_eq!(a, b);
    }
}
