//! Glob expansion of templates into concrete files.
//!
//! Patterns are matched one path segment at a time through [`FileSystem`],
//! so the same code walks real sysfs and in-memory fixtures.

use std::path::{Component as PathComponent, Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::collector::error::CollectError;
use crate::collector::template::Template;
use crate::collector::traits::FileSystem;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A template matched to one concrete file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget<'a> {
    pub template: &'a Template,
    pub path: PathBuf,
    /// Directory name identifying the Lustre target the file belongs to.
    pub node: String,
}

enum Segment {
    Literal(&'static str),
    Glob(Pattern),
}

impl Segment {
    fn compile(segment: &'static str, template: &Template) -> Result<Self, CollectError> {
        if !segment.contains(['*', '?', '[']) {
            return Ok(Segment::Literal(segment));
        }
        Pattern::new(segment)
            .map(Segment::Glob)
            .map_err(|e| CollectError::Pattern {
                pattern: format!("{}/{}", template.path_pattern, template.filename),
                message: e.to_string(),
            })
    }
}

/// Expands `template` below `base`.
///
/// An empty result is not an error. Matches are returned in lexical order.
pub fn resolve<'a, F: FileSystem>(
    fs: &F,
    base: &Path,
    template: &'a Template,
) -> Result<Vec<ResolvedTarget<'a>>, CollectError> {
    let segments = template
        .pattern_segments()
        .into_iter()
        .map(|segment| Segment::compile(segment, template))
        .collect::<Result<Vec<_>, _>>()?;

    let mut current = vec![base.to_path_buf()];
    for segment in &segments {
        let mut next = Vec::new();
        for dir in &current {
            match segment {
                Segment::Literal(name) => {
                    let candidate = dir.join(name);
                    if fs.exists(&candidate) {
                        next.push(candidate);
                    }
                }
                Segment::Glob(pattern) => {
                    // Unreadable directories simply contribute no matches.
                    let Ok(entries) = fs.read_dir(dir) else {
                        continue;
                    };
                    let mut matched: Vec<PathBuf> = entries
                        .into_iter()
                        .filter(|entry| {
                            entry
                                .file_name()
                                .and_then(|name| name.to_str())
                                .is_some_and(|name| pattern.matches_with(name, MATCH_OPTIONS))
                        })
                        .collect();
                    matched.sort();
                    next.extend(matched);
                }
            }
        }
        if next.is_empty() {
            return Ok(Vec::new());
        }
        current = next;
    }

    let depth = template.directory_depth();
    current
        .into_iter()
        .map(|path| {
            let node = node_identifier(&path, depth)?;
            Ok(ResolvedTarget {
                template,
                path,
                node,
            })
        })
        .collect()
}

/// Returns the path component `depth + 1` levels above the leaf file.
pub fn node_identifier(path: &Path, depth: usize) -> Result<String, CollectError> {
    let components: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            PathComponent::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if components.len() < depth + 2 {
        return Err(CollectError::MalformedLayout {
            path: path.to_path_buf(),
            depth,
        });
    }

    Ok(components[components.len() - 2 - depth].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use crate::collector::template::{Component, Strategy, Tier};
    use crate::metrics::MetricKind;

    const BASE: &str = "/sys/fs/lustre";

    fn template(path_pattern: &'static str, filename: &'static str) -> Template {
        Template {
            component: Component::Ost,
            path_pattern,
            filename,
            metric_name: "m",
            help_text: "h",
            kind: MetricKind::Gauge,
            strategy: Strategy::Scalar,
            has_multiple_values: false,
            with_extremes: false,
            tier: Tier::Core,
        }
    }

    #[test]
    fn test_resolve_multiple_targets_sorted() {
        let mut fs = MockFs::new();
        fs.add_file(format!("{BASE}/obdfilter/lustre-OST0001/degraded"), "0\n");
        fs.add_file(format!("{BASE}/obdfilter/lustre-OST0000/degraded"), "1\n");
        fs.add_file(format!("{BASE}/obdfilter/lustre-MDT0000/degraded"), "1\n");

        let t = template("obdfilter/*-OST*", "degraded");
        let targets = resolve(&fs, Path::new(BASE), &t).unwrap();

        let nodes: Vec<&str> = targets.iter().map(|t| t.node.as_str()).collect();
        assert_eq!(nodes, vec!["lustre-OST0000", "lustre-OST0001"]);
        assert_eq!(
            targets[0].path,
            PathBuf::from(format!("{BASE}/obdfilter/lustre-OST0000/degraded"))
        );
    }

    #[test]
    fn test_resolve_nested_filename() {
        let mut fs = MockFs::new();
        fs.add_file(
            format!("{BASE}/ldlm/namespaces/filter-lustre-OST0000_UUID/pool/granted"),
            "12\n",
        );

        let t = template("ldlm/namespaces/filter-*", "pool/granted");
        let targets = resolve(&fs, Path::new(BASE), &t).unwrap();

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].node, "filter-lustre-OST0000_UUID");
    }

    #[test]
    fn test_resolve_no_match_is_empty() {
        let fs = MockFs::new();
        let t = template("osd-*/*-OST*", "kbytesfree");
        assert!(resolve(&fs, Path::new(BASE), &t).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_literal_path() {
        let mut fs = MockFs::new();
        fs.add_file(format!("{BASE}/mgs/MGS/osd/blocksize"), "4096\n");

        let t = template("mgs/MGS/osd/", "blocksize");
        let targets = resolve(&fs, Path::new(BASE), &t).unwrap();

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].node, "osd");
    }

    #[test]
    fn test_resolve_invalid_pattern() {
        let fs = MockFs::new();
        let t = template("obdfilter/[-OST", "degraded");
        let err = resolve(&fs, Path::new(BASE), &t).unwrap_err();
        assert!(matches!(err, CollectError::Pattern { .. }));
    }

    #[test]
    fn test_node_identifier_too_short() {
        let err = node_identifier(Path::new("/granted"), 1).unwrap_err();
        assert!(matches!(err, CollectError::MalformedLayout { depth: 1, .. }));
    }

    #[test]
    fn test_node_identifier_health_check() {
        let node = node_identifier(Path::new("/sys/fs/lustre/health_check"), 0).unwrap();
        assert_eq!(node, "lustre");
    }
}
