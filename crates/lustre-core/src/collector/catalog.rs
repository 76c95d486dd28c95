//! Static template catalogs per Lustre subsystem.
//!
//! Each catalog maps a directory glob (relative to `<sys>/fs/lustre`) to the
//! files found below it. [`build_templates`] filters the catalogs through the
//! exporter configuration once, at startup.

use crate::collector::template::{CommandTemplate, Component, Strategy, Template, Tier};
use crate::config::{ExporterConfig, Selection};
use crate::metrics::MetricKind;

/// Catalog row; combined with its directory glob and component to form a [`Template`].
#[derive(Debug, Clone, Copy)]
struct Entry {
    filename: &'static str,
    metric_name: &'static str,
    help_text: &'static str,
    kind: MetricKind,
    strategy: Strategy,
    has_multiple_values: bool,
    /// Tier gating the minimum/maximum gauges of a single-value stats row.
    extremes: Tier,
    tier: Tier,
}

const fn scalar(
    filename: &'static str,
    metric_name: &'static str,
    help_text: &'static str,
    kind: MetricKind,
    tier: Tier,
) -> Entry {
    Entry {
        filename,
        metric_name,
        help_text,
        kind,
        strategy: Strategy::Scalar,
        has_multiple_values: false,
        extremes: tier,
        tier,
    }
}

const fn gauge(f: &'static str, m: &'static str, h: &'static str, tier: Tier) -> Entry {
    scalar(f, m, h, MetricKind::Gauge, tier)
}

const fn counter(f: &'static str, m: &'static str, h: &'static str, tier: Tier) -> Entry {
    scalar(f, m, h, MetricKind::Counter, tier)
}

/// Stats row fanned out into sample count and magnitude fields.
///
/// The sample count and total follow `tier`; minimum and maximum follow `extremes`.
const fn stats_io(
    f: &'static str,
    m: &'static str,
    h: &'static str,
    tier: Tier,
    extremes: Tier,
) -> Entry {
    Entry {
        filename: f,
        metric_name: m,
        help_text: h,
        kind: MetricKind::Counter,
        strategy: Strategy::Stats,
        has_multiple_values: false,
        extremes,
        tier,
    }
}

/// Every stats row as one sample labeled by operation.
const fn stats_ops(f: &'static str, m: &'static str, h: &'static str, tier: Tier) -> Entry {
    Entry {
        filename: f,
        metric_name: m,
        help_text: h,
        kind: MetricKind::Counter,
        strategy: Strategy::Stats,
        has_multiple_values: true,
        extremes: tier,
        tier,
    }
}

use Tier::{Core, Extended};

const HEALTH: &[(&str, &[Entry])] = &[(
    "",
    &[Entry {
        filename: "health_check",
        metric_name: "health_check",
        help_text: "Current health status for the indicated instance: 1 refers to 'healthy', 0 refers to 'unhealthy'",
        kind: MetricKind::Gauge,
        strategy: Strategy::Health,
        has_multiple_values: false,
        extremes: Core,
        tier: Core,
    }],
)];

const OSD: &[Entry] = &[
    gauge("blocksize", "blocksize_bytes", "Filesystem block size in bytes", Core),
    gauge("filesfree", "inodes_free", "The number of inodes (objects) available", Core),
    gauge("filestotal", "inodes_maximum", "The maximum number of inodes (objects) the filesystem can hold", Core),
    gauge("kbytesavail", "available_kilobytes", "Number of kilobytes readily available in the pool", Core),
    gauge("kbytesfree", "free_kilobytes", "Number of kilobytes free in the pool", Core),
    gauge("kbytestotal", "capacity_kilobytes", "Capacity of the pool in kilobytes", Core),
];

const OST: &[(&str, &[Entry])] = &[
    (
        "obdfilter/*-OST*",
        &[
            gauge("degraded", "degraded", "Binary indicator as to whether or not the pool is degraded - 0 for not degraded, 1 for degraded", Core),
            gauge("grant_precreate", "grant_precreate_capacity_bytes", "Maximum space in bytes that clients can preallocate for objects", Extended),
            gauge("grant_compat_disable", "grant_compat_disabled", "Binary indicator as to whether clients with OBD_CONNECT_GRANT_PARAM setting will be granted space", Extended),
            gauge("job_cleanup_interval", "job_cleanup_interval_seconds", "Interval in seconds between cleanup of tuning statistics", Extended),
            gauge("lfsck_speed_limit", "lfsck_speed_limit", "Maximum operations per second LFSCK (Lustre filesystem verification) can run", Extended),
            counter("num_exports", "exports_total", "Total number of times the pool has been exported", Core),
            gauge("recovery_time_hard", "recovery_time_hard_seconds", "Maximum timeout 'recover_time_soft' can increment to for a single server", Extended),
            gauge("recovery_time_soft", "recovery_time_soft_seconds", "Duration in seconds for a client to attempt to reconnect after a crash (automatically incremented if servers are still in an error state)", Extended),
            gauge("precreate_batch", "precreate_batch", "Maximum number of objects that can be included in a single transaction", Extended),
            gauge("soft_sync_limit", "soft_sync_limit", "Number of RPCs necessary before triggering a sync", Extended),
            gauge("sync_journal", "sync_journal_enabled", "Binary indicator as to whether or not the journal is set for asynchronous commits", Extended),
            counter("tot_dirty", "exports_dirty_total", "Total number of exports that have been marked dirty", Core),
            counter("tot_granted", "exports_granted_total", "Total number of exports that have been marked granted", Core),
            counter("tot_pending", "exports_pending_total", "Total number of exports that have been marked pending", Core),
        ],
    ),
    ("osd-*/*-OST*", OSD),
    (
        "ldlm/namespaces/filter-*",
        &[
            gauge("lock_count", "lock_count", "Number of locks", Extended),
            counter("lock_timeouts", "lock_timeout", "Number of lock timeouts", Extended),
            gauge("contended_locks", "lock_contended", "Number of contended locks", Extended),
            gauge("contention_seconds", "lock_contention_seconds", "Time in seconds during which locks were contended", Extended),
            gauge("pool/granted", "lock_granted", "Number of granted locks", Extended),
            gauge("pool/grant_plan", "lock_grant_plan", "Number of planned lock grants per second", Extended),
            gauge("pool/grant_rate", "lock_grant_rate", "Lock grant rate", Extended),
        ],
    ),
];

const MDT: &[(&str, &[Entry])] = &[
    ("osd-*/*-MDT*", OSD),
    (
        "mdt/*",
        &[
            counter("num_exports", "exports_total", "Total number of times the pool has been exported", Core),
            stats_ops("md_stats", "stats_total", "Number of metadata operations the target has performed", Extended),
        ],
    ),
];

const MGS: &[(&str, &[Entry])] = &[("mgs/MGS/osd/", OSD)];

const CLIENT: &[(&str, &[Entry])] = &[(
    "llite/*",
    &[
        gauge("blocksize", "blocksize_bytes", "Filesystem block size in bytes", Core),
        gauge("checksum_pages", "checksum_pages_enabled", "Returns '1' if data checksumming is enabled for the client", Extended),
        gauge("default_easize", "default_ea_size_bytes", "Default Extended Attribute (EA) size in bytes", Extended),
        gauge("filesfree", "inodes_free", "The number of inodes (objects) available", Core),
        gauge("filestotal", "inodes_maximum", "The maximum number of inodes (objects) the filesystem can hold", Core),
        gauge("kbytesavail", "available_kilobytes", "Number of kilobytes readily available in the pool", Core),
        gauge("kbytesfree", "free_kilobytes", "Number of kilobytes free in the pool", Core),
        gauge("kbytestotal", "capacity_kilobytes", "Capacity of the pool in kilobytes", Core),
        gauge("lazystatfs", "lazystatfs_enabled", "Returns '1' if lazystatfs (a non-blocking alternative to statfs) is enabled for the client", Extended),
        gauge("max_easize", "maximum_ea_size_bytes", "Maximum Extended Attribute (EA) size in bytes", Extended),
        gauge("max_read_ahead_mb", "maximum_read_ahead_megabytes", "Maximum number of megabytes to read ahead", Extended),
        gauge("max_read_ahead_per_file_mb", "maximum_read_ahead_per_file_megabytes", "Maximum number of megabytes per file to read ahead", Extended),
        gauge("max_read_ahead_whole_mb", "maximum_read_ahead_whole_megabytes", "Maximum file size in megabytes for a file to be read in its entirety", Extended),
        gauge("statahead_agl", "statahead_agl_enabled", "Returns '1' if the Asynchronous Glimpse Lock (AGL) for statahead is enabled", Extended),
        gauge("statahead_max", "statahead_maximum", "Maximum window size for statahead", Extended),
        stats_io("stats", "read", "Client read operations", Core, Extended),
        stats_io("stats", "write", "Client write operations", Core, Extended),
        stats_ops("stats", "stats_total", "Number of operations the filesystem has performed", Core),
        gauge("xattr_cache", "xattr_cache_enabled", "Returns '1' if extended attribute cache is enabled", Extended),
    ],
)];

const MDT_COMMANDS: &[CommandTemplate] = &[CommandTemplate {
    component: Component::Mdt,
    param: "mdd.*-*.changelog_users",
    tier: Extended,
}];

fn expand(
    component: Component,
    selection: Selection,
    catalog: &[(&'static str, &'static [Entry])],
    out: &mut Vec<Template>,
) {
    for &(path_pattern, entries) in catalog {
        for entry in entries.iter().filter(|e| e.tier.is_selected(selection)) {
            out.push(Template {
                component,
                path_pattern,
                filename: entry.filename,
                metric_name: entry.metric_name,
                help_text: entry.help_text,
                kind: entry.kind,
                strategy: entry.strategy,
                has_multiple_values: entry.has_multiple_values,
                with_extremes: entry.extremes.is_selected(selection),
                tier: entry.tier,
            });
        }
    }
}

/// Builds the file-based templates enabled by `config`.
pub fn build_templates(config: &ExporterConfig) -> Vec<Template> {
    let mut templates = Vec::new();
    expand(Component::Health, config.health, HEALTH, &mut templates);
    expand(Component::Ost, config.ost, OST, &mut templates);
    expand(Component::Mdt, config.mdt, MDT, &mut templates);
    expand(Component::Mgs, config.mgs, MGS, &mut templates);
    expand(Component::Client, config.client, CLIENT, &mut templates);
    templates
}

/// Builds the command-based templates enabled by `config`.
pub fn build_command_templates(config: &ExporterConfig) -> Vec<CommandTemplate> {
    MDT_COMMANDS
        .iter()
        .filter(|t| t.tier.is_selected(config.mdt))
        .cloned()
        .collect()
}
