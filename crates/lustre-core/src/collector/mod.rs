//! Lustre metric collection.
//!
//! Status files under `/sys/fs/lustre` and `lctl get_param` output are turned
//! into [`Measurement`](crate::metrics::Measurement)s, driven by a static
//! template catalog.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Collector                           │
//! │  ┌──────────────────────────┐  ┌──────────────────────────┐  │
//! │  │       SysfsSource        │  │       LctlSource         │  │
//! │  │  - Template catalog      │  │  - changelog_users       │  │
//! │  │  - glob resolver         │  │  - command or replay     │  │
//! │  └────────────┬─────────────┘  └──────┬────────────┬──────┘  │
//! │               └──────────────┬────────┘            │         │
//! │                       ┌──────▼──────┐      ┌───────▼───────┐ │
//! │                       │  FileSystem │      │ CommandRunner │ │
//! │                       └──────┬──────┘      └───────┬───────┘ │
//! └──────────────────────────────┼─────────────────────┼─────────┘
//!                       ┌────────┴───────┐     ┌───────┴────────┐
//!                       │ RealFs  MockFs │     │ Sudo   Mock    │
//!                       └────────────────┘     └────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use lustre_core::collector::{Collector, MockCommands, MockFs};
//! use lustre_core::config::{ExporterConfig, Selection};
//! use lustre_core::metrics::Measurement;
//!
//! let config = ExporterConfig {
//!     mdt: Selection::Core,
//!     ..ExporterConfig::default()
//! };
//! let collector = Collector::new(MockFs::lustre_server(), MockCommands::new(), &config);
//!
//! let mut measurements: Vec<Measurement> = Vec::new();
//! let report = collector.collect(&mut measurements);
//! assert!(report.is_complete());
//! assert_eq!(report.measurements, measurements.len());
//! ```

pub mod catalog;
#[allow(clippy::module_inception)]
mod collector;
mod error;
pub mod lctl;
pub mod mock;
pub mod resolver;
pub mod sysfs;
pub mod template;
pub mod traits;

pub use collector::{Collector, CycleReport, Source, SourceTiming};
pub use error::{CollectError, CycleError, SourceKind};
pub use mock::{MockCommands, MockFs};
pub use resolver::{ResolvedTarget, resolve};
pub use template::{CommandTemplate, Component, Strategy, Template, Tier};
pub use traits::{CommandError, CommandRunner, FileSystem, RealFs, SudoRunner};
