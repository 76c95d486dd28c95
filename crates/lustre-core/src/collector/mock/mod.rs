//! In-memory fixtures: a mock filesystem, scripted commands and Lustre node scenarios.

mod commands;
mod filesystem;
mod scenarios;

pub use commands::MockCommands;
pub use filesystem::MockFs;
pub use scenarios::SERVER_CHANGELOG_USERS;
