//! Visual styling utilities for the CLI.
//!
//! Spinners for scans, table styles and the colored online/offline marker.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use crate::cli::StyleMode;

/// Standard spinner tick characters (Braille dots animation)
const SPINNER_TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard spinner tick interval
const SPINNER_TICK_MS: u64 = 80;

/// Get the standard spinner style.
fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_TICK_CHARS)
}

/// Create a spinner for scanning operations.
pub fn scanning_spinner(timeout: Duration) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(format!(
        "Scanning for WyLight controllers... ({:.1}s)",
        timeout.as_secs_f64()
    ));
    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
    pb
}

/// Online/offline marker for the endpoint tables.
pub fn format_state(online: bool, no_color: bool) -> String {
    match (online, no_color) {
        (true, true) => "online".to_string(),
        (false, true) => "offline".to_string(),
        (true, false) => format!("{}", "online".green()),
        (false, false) => format!("{}", "offline".dimmed()),
    }
}

/// Apply a table style matching the style mode.
pub fn apply_table_style(table: &mut tabled::Table, style: StyleMode) {
    use tabled::settings::Style;
    match style {
        StyleMode::Rich => {
            table.with(Style::rounded());
        }
        StyleMode::Plain => {
            table.with(Style::blank());
        }
    }
}
