//! Command implementations for the CLI.

mod config;
mod recent;
mod scan;
mod select;

pub use config::cmd_config;
pub use recent::cmd_recent;
pub use scan::cmd_scan;
pub use select::{SelectArgs, cmd_select};
