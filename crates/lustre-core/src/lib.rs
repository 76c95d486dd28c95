//! lustre-core - metric extraction for Lustre filesystem nodes.
//!
//! Provides:
//! - `collector` - template catalog, glob resolver, sysfs and lctl sources
//! - `config` - exporter configuration and collector selections
//! - `metrics` - measurement model and Prometheus text rendering

pub mod collector;
pub mod config;
pub mod metrics;
