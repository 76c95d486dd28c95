//! File-based collection from the Lustre sysfs tree.
//!
//! Templates are expanded against `<sys>/fs/lustre` and each matched file is
//! parsed as a scalar, a health token or a stats table.

pub mod parser;
mod source;

pub use parser::{ParseError, StatsRow, StatsSample};
pub use source::SysfsSource;
