//! Parser for `lctl get_param mdd.*-*.changelog_users` output.
//!
//! Example block:
//!
//! ```text
//! mdd.lustre-MDT0000.changelog_users=
//! current index: 34
//! ID    index (idle seconds)
//! cl1   0 (1725676)
//! cl2   34 (28)
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::collector::template::Component;
use crate::metrics::{Measurement, MetricKind};

pub const CURRENT_INDEX_METRIC: &str = "changelog_current_index";
pub const USER_INDEX_METRIC: &str = "changelog_user_index";
pub const USER_IDLE_METRIC: &str = "changelog_user_idle_time";

/// Label naming the registered changelog consumer.
pub const USER_LABEL: &str = "id";

static TARGET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"mdd\.([\w-]+-MDT[0-9]+)\.changelog_users=").expect("valid changelog target regex")
});

static CURRENT_INDEX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"current index:\s*([0-9]+)").expect("valid changelog index regex")
});

static USER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(\w+)[ \t]+([0-9]+)[ \t]+\(([0-9]+)\)")
        .expect("valid changelog user regex")
});

/// Failure to extract a mandatory anchor from changelog output.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangelogError {
    NoTarget,
    NoCurrentIndex,
    InvalidNumber { field: &'static str, value: String },
}

impl std::fmt::Display for ChangelogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangelogError::NoTarget => write!(f, "no target found in changelogs"),
            ChangelogError::NoCurrentIndex => write!(f, "no current index found for changelogs"),
            ChangelogError::InvalidNumber { field, value } => {
                write!(f, "invalid {} '{}' in changelogs", field, value)
            }
        }
    }
}

impl std::error::Error for ChangelogError {}

/// One registered changelog consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangelogUser {
    pub id: String,
    pub index: f64,
    pub idle_seconds: f64,
}

/// Changelog state of one metadata target.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangelogRecord {
    pub target: String,
    pub current_index: f64,
    pub users: Vec<ChangelogUser>,
}

impl ChangelogRecord {
    /// Converts the record into measurements: the current index first, then
    /// an index counter and an idle-time gauge per user.
    pub fn measurements(&self) -> Vec<Measurement> {
        let component = Component::Mdt.as_str();
        let base = |name: &str, kind: MetricKind, help: &str, value: f64| {
            Measurement::new(name, kind, help, value).with_base_labels(component, &self.target)
        };

        let mut out = Vec::with_capacity(1 + self.users.len() * 2);
        out.push(base(
            CURRENT_INDEX_METRIC,
            MetricKind::Counter,
            "Changelog current index.",
            self.current_index,
        ));
        for user in &self.users {
            out.push(
                base(
                    USER_INDEX_METRIC,
                    MetricKind::Counter,
                    "Index of registered changelog user.",
                    user.index,
                )
                .with_label(USER_LABEL, &user.id),
            );
            out.push(
                base(
                    USER_IDLE_METRIC,
                    MetricKind::Gauge,
                    "Idle time in seconds of registered changelog user.",
                    user.idle_seconds,
                )
                .with_label(USER_LABEL, &user.id),
            );
        }
        out
    }
}

fn number(field: &'static str, raw: &str) -> Result<f64, ChangelogError> {
    raw.parse().map_err(|_| ChangelogError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

/// Extracts the metadata target name from the block header.
pub fn capture_target(text: &str) -> Result<String, ChangelogError> {
    TARGET_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|target| !target.is_empty())
        .map(str::to_string)
        .ok_or(ChangelogError::NoTarget)
}

/// Extracts the `current index:` value.
pub fn capture_current_index(text: &str) -> Result<f64, ChangelogError> {
    let raw = CURRENT_INDEX_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or(ChangelogError::NoCurrentIndex)?;
    number("current index", raw.as_str())
}

/// Extracts the per-user rows, in output order. No rows is not an error.
pub fn capture_users(text: &str) -> Result<Vec<ChangelogUser>, ChangelogError> {
    USER_REGEX
        .captures_iter(text)
        .map(|caps| {
            Ok(ChangelogUser {
                id: caps[1].to_string(),
                index: number("user index", &caps[2])?,
                idle_seconds: number("idle time", &caps[3])?,
            })
        })
        .collect()
}

/// Parses one `changelog_users` block.
pub fn parse_changelog(text: &str) -> Result<ChangelogRecord, ChangelogError> {
    let target = capture_target(text)?;
    let current_index = capture_current_index(text)?;
    let users = capture_users(text)?;
    Ok(ChangelogRecord {
        target,
        current_index,
        users,
    })
}

/// Splits output covering several MDTs at each block header.
///
/// Text before the first header is dropped. Returns an empty list when no
/// header is present.
pub fn split_changelog_blocks(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = TARGET_REGEX.find_iter(text).map(|m| m.start()).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect()
}

/// Parses the complete output, one record per MDT.
pub fn parse_changelogs(text: &str) -> Result<Vec<ChangelogRecord>, ChangelogError> {
    let blocks = split_changelog_blocks(text);
    if blocks.is_empty() {
        return Err(ChangelogError::NoTarget);
    }
    blocks.into_iter().map(parse_changelog).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: &str = "mdd.lustre-MDT0000.changelog_users=
\tcurrent index: 34
\tID    index (idle seconds)
\tcl1   0 (1725676)
\tcl2   34 (28)";

    #[test]
    fn test_capture_target() {
        assert_eq!(
            capture_target("mdd.lustre-MDT0000.changelog_users=").unwrap(),
            "lustre-MDT0000"
        );
        assert_eq!(
            capture_target("mdd..changelog_users=").unwrap_err(),
            ChangelogError::NoTarget
        );
        assert_eq!(
            capture_target("mdd.lustre.changelog_users=").unwrap_err(),
            ChangelogError::NoTarget
        );
    }

    #[test]
    fn test_capture_current_index() {
        assert_eq!(capture_current_index(BLOCK).unwrap(), 34.0);
        assert_eq!(
            capture_current_index("mdd.lustre-MDT0000.changelog_users=\n\tcurrent index: 0")
                .unwrap(),
            0.0
        );
        assert_eq!(
            capture_current_index("mdd.lustre-MDT0000.changelog_users=\n\tID    index (idle seconds)")
                .unwrap_err(),
            ChangelogError::NoCurrentIndex
        );
    }

    #[test]
    fn test_capture_users() {
        let users = capture_users(BLOCK).unwrap();
        assert_eq!(
            users,
            vec![
                ChangelogUser {
                    id: "cl1".to_string(),
                    index: 0.0,
                    idle_seconds: 1725676.0,
                },
                ChangelogUser {
                    id: "cl2".to_string(),
                    index: 34.0,
                    idle_seconds: 28.0,
                },
            ]
        );
    }

    #[test]
    fn test_capture_users_none() {
        let text = "mdd.lustre-MDT0000.changelog_users=\ncurrent index: 5\nID    index (idle seconds)\n";
        assert!(capture_users(text).unwrap().is_empty());
        let record = parse_changelog(text).unwrap();
        assert_eq!(record.current_index, 5.0);
        assert!(record.users.is_empty());
    }

    #[test]
    fn test_parse_changelog_is_deterministic() {
        assert_eq!(parse_changelog(BLOCK).unwrap(), parse_changelog(BLOCK).unwrap());
    }

    #[test]
    fn test_measurements_order_and_labels() {
        let measurements = parse_changelog(BLOCK).unwrap().measurements();
        let names: Vec<&str> = measurements.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                CURRENT_INDEX_METRIC,
                USER_INDEX_METRIC,
                USER_IDLE_METRIC,
                USER_INDEX_METRIC,
                USER_IDLE_METRIC,
            ]
        );

        assert_eq!(measurements[0].labels.len(), 2);
        assert_eq!(measurements[0].label("component"), Some("mdt"));
        assert_eq!(measurements[0].label("target"), Some("lustre-MDT0000"));

        let idle = &measurements[2];
        assert_eq!(idle.kind, MetricKind::Gauge);
        assert_eq!(idle.value, 1725676.0);
        assert_eq!(
            idle.label_names().collect::<Vec<_>>(),
            vec!["component", "target", "id"]
        );
        assert_eq!(idle.label("id"), Some("cl1"));
        for m in &measurements {
            assert_eq!(m.label_names().count(), m.label_values().count());
        }
    }

    #[test]
    fn test_parse_changelogs_multiple_targets() {
        let text = "mdd.fs-MDT0000.changelog_users=
current index: 10
ID    index (idle seconds)
cl1   10 (3)
mdd.fs-MDT0001.changelog_users=
current index: 7
ID    index (idle seconds)
";
        let records = parse_changelogs(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].target, "fs-MDT0000");
        assert_eq!(records[0].users.len(), 1);
        assert_eq!(records[1].target, "fs-MDT0001");
        assert_eq!(records[1].current_index, 7.0);
        assert!(records[1].users.is_empty());
    }

    #[test]
    fn test_parse_changelogs_missing_index_in_second_block() {
        let text = "mdd.fs-MDT0000.changelog_users=\ncurrent index: 1\nmdd.fs-MDT0001.changelog_users=\n";
        assert_eq!(
            parse_changelogs(text).unwrap_err(),
            ChangelogError::NoCurrentIndex
        );
    }

    #[test]
    fn test_parse_changelogs_no_header() {
        assert_eq!(
            parse_changelogs("error: get_param: param_path 'mdd/*-*/changelog_users': No such file or directory")
                .unwrap_err(),
            ChangelogError::NoTarget
        );
    }
}
