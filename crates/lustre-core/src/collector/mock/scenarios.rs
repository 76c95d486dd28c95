//! Pre-built mock filesystem scenarios for testing.
//!
//! Trees are rooted at `/sys/fs/lustre`, the default collector base.

use super::filesystem::MockFs;

const ROOT: &str = "/sys/fs/lustre";

const OSD_FILES: &[(&str, &str)] = &[
    ("blocksize", "4096\n"),
    ("filesfree", "1048000\n"),
    ("filestotal", "1048576\n"),
    ("kbytesavail", "9437184\n"),
    ("kbytesfree", "9961472\n"),
    ("kbytestotal", "10485760\n"),
];

/// Output of `lctl get_param mdd.*-*.changelog_users` on [`MockFs::lustre_server`].
pub const SERVER_CHANGELOG_USERS: &str = "\
mdd.lustre-MDT0000.changelog_users=
current index: 34
ID    index (idle seconds)
cl1   0 (1725676)
cl2   34 (28)
";

impl MockFs {
    /// A combined MGS/MDS/OSS node: one MDT and two OSTs.
    pub fn lustre_server() -> Self {
        let mut fs = Self::new();
        fs.add_file(format!("{ROOT}/health_check"), "healthy\n");

        for ost in ["lustre-OST0000", "lustre-OST0001"] {
            fs.add_target(
                format!("{ROOT}/obdfilter/{ost}"),
                &[
                    ("degraded", "0\n"),
                    ("grant_precreate", "278921216\n"),
                    ("grant_compat_disable", "0\n"),
                    ("job_cleanup_interval", "600\n"),
                    ("lfsck_speed_limit", "0\n"),
                    ("num_exports", "4\n"),
                    ("recovery_time_hard", "900\n"),
                    ("recovery_time_soft", "300\n"),
                    ("precreate_batch", "128\n"),
                    ("soft_sync_limit", "16\n"),
                    ("sync_journal", "0\n"),
                    ("tot_dirty", "0\n"),
                    ("tot_granted", "8650752\n"),
                    ("tot_pending", "0\n"),
                ],
            );
            fs.add_target(format!("{ROOT}/osd-ldiskfs/{ost}"), OSD_FILES);
            fs.add_target(
                format!("{ROOT}/ldlm/namespaces/filter-{ost}_UUID"),
                &[
                    ("lock_count", "5\n"),
                    ("lock_timeouts", "0\n"),
                    ("contended_locks", "32\n"),
                    ("contention_seconds", "2\n"),
                    ("pool/granted", "5\n"),
                    ("pool/grant_plan", "262144\n"),
                    ("pool/grant_rate", "0\n"),
                ],
            );
        }

        fs.add_target(format!("{ROOT}/osd-ldiskfs/lustre-MDT0000"), OSD_FILES);
        fs.add_target(
            format!("{ROOT}/mdt/lustre-MDT0000"),
            &[
                ("num_exports", "6\n"),
                (
                    "md_stats",
                    "\
snapshot_time             1499977591.123456789 secs.nsecs
open                      2046 samples [reqs]
close                     2039 samples [reqs]
getattr                   8191 samples [reqs]
statfs                    17 samples [reqs]
",
                ),
            ],
        );

        fs.add_target(format!("{ROOT}/mgs/MGS/osd"), OSD_FILES);
        fs
    }

    /// A client node with one mounted filesystem.
    pub fn lustre_client() -> Self {
        let mut fs = Self::new();
        fs.add_file(format!("{ROOT}/health_check"), "healthy\n");
        fs.add_target(
            format!("{ROOT}/llite/lustre-ffff880035afa000"),
            &[
                ("blocksize", "4096\n"),
                ("checksum_pages", "1\n"),
                ("default_easize", "128\n"),
                ("filesfree", "2096000\n"),
                ("filestotal", "2097152\n"),
                ("kbytesavail", "18874368\n"),
                ("kbytesfree", "19922944\n"),
                ("kbytestotal", "20971520\n"),
                ("lazystatfs", "1\n"),
                ("max_easize", "65536\n"),
                ("max_read_ahead_mb", "64\n"),
                ("max_read_ahead_per_file_mb", "64\n"),
                ("max_read_ahead_whole_mb", "2\n"),
                ("statahead_agl", "1\n"),
                ("statahead_max", "32\n"),
                (
                    "stats",
                    "\
snapshot_time             1499977591.123456789 secs.nsecs
read_bytes                17 samples [bytes] 4096 1048576 11111111
write_bytes               9 samples [bytes] 4096 1048576 7777777
open                      4 samples [reqs]
close                     3 samples [reqs]
getattr                   12 samples [reqs]
",
                ),
                ("xattr_cache", "1\n"),
            ],
        );
        fs
    }

    /// A node whose Lustre modules are not loaded.
    pub fn without_lustre() -> Self {
        let mut fs = Self::new();
        fs.add_dir("/sys/fs");
        fs
    }
}
