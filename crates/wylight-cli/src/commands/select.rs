//! Select command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing::info;
use wylight_core::Endpoint;

use crate::cli::{OutputFormat, ScanArgs};
use crate::config::{Config, ScanSettings};
use crate::format::{
    FormatOptions, format_selection_csv, format_selection_json, format_selection_text,
};
use crate::util::{Target, open_store, write_output};

use super::scan::{new_browser, run_scan};

/// Arguments for the select command.
pub struct SelectArgs<'a> {
    pub target: &'a str,
    pub scan: bool,
    pub scan_args: &'a ScanArgs,
    pub recent: PathBuf,
}

pub async fn cmd_select(
    args: SelectArgs<'_>,
    format: OutputFormat,
    output: Option<&PathBuf>,
    quiet: bool,
    opts: &FormatOptions,
    config: &Config,
) -> Result<()> {
    let target: Target = args.target.parse()?;
    let mut store = open_store(&args.recent)?;
    let settings = ScanSettings::resolve(args.scan_args, config);
    let mut browser = new_browser(&settings, &store)?;

    if args.scan {
        run_scan(&mut browser, !quiet && matches!(format, OutputFormat::Text)).await?;
    }

    let index = target.position(browser.list()).ok_or_else(|| {
        anyhow!(
            "No controller matches '{}'.\n\
             Run 'wylight scan' to list controllers, or pass --scan to scan first.",
            args.target
        )
    })?;
    let selected: Endpoint = browser.select(index)?;

    store.remember(&selected).with_context(|| {
        format!(
            "Failed to remember {} in {}",
            selected,
            store.path().display()
        )
    })?;
    info!("Remembered {} (used {} time(s))", selected, selected.score);

    let content = match format {
        OutputFormat::Json => format_selection_json(&selected, opts)?,
        OutputFormat::Text => format_selection_text(&selected, opts),
        OutputFormat::Csv => format_selection_csv(&selected, opts),
    };
    write_output(output, &content)
}
