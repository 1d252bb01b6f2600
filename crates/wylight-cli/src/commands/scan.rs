//! Scan command implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::{debug, info};
use wylight_core::{RemoteBrowser, ScanSummary};
use wylight_store::RecentStore;

use crate::cli::{OutputFormat, ScanArgs};
use crate::config::{Config, ScanSettings};
use crate::format::{FormatOptions, format_scan_csv, format_scan_json, format_scan_text};
use crate::style;
use crate::util::{open_store, write_output};

pub async fn cmd_scan(
    args: &ScanArgs,
    format: OutputFormat,
    output: Option<&PathBuf>,
    recent: &Path,
    quiet: bool,
    opts: &FormatOptions,
    config: &Config,
) -> Result<()> {
    let settings = ScanSettings::resolve(args, config);
    let store = open_store(recent)?;
    let mut browser = new_browser(&settings, &store)?;

    // Show spinner for text output (unless quiet)
    let show_spinner = !quiet && matches!(format, OutputFormat::Text);
    let summary = run_scan(&mut browser, show_spinner).await?;

    let endpoints = browser.list().as_slice();
    let content = match format {
        OutputFormat::Json => format_scan_json(endpoints, Some(&summary), opts)?,
        OutputFormat::Text => format_scan_text(endpoints, Some(&summary), opts),
        OutputFormat::Csv => format_scan_csv(endpoints, opts),
    };

    write_output(output, &content)
}

/// Browser seeded with the recent controllers, listening per `settings`.
pub(crate) fn new_browser(settings: &ScanSettings, store: &RecentStore) -> Result<RemoteBrowser> {
    let receiver = settings.receiver()?;
    debug!("Using {} recent controller(s)", store.len());
    Ok(RemoteBrowser::new(Arc::new(receiver))
        .with_timeout(settings.timeout)
        .with_known(store.iter().cloned()))
}

/// Run one scan, stopping early on Ctrl+C.
pub(crate) async fn run_scan(browser: &mut RemoteBrowser, show_spinner: bool) -> Result<ScanSummary> {
    browser.begin_scan()?;
    let spinner = show_spinner.then(|| style::scanning_spinner(browser.timeout()));

    // Clear spinner before output
    let mut release_spinner = |_: &ScanSummary| {
        if let Some(sp) = &spinner {
            sp.finish_and_clear();
        }
    };

    let summary = tokio::select! {
        summary = browser.finish_scan(&mut release_spinner) => summary,
        _ = tokio::signal::ctrl_c() => None,
    };

    let Some(summary) = summary else {
        browser.teardown().await;
        if let Some(sp) = &spinner {
            sp.finish_and_clear();
        }
        bail!("Scan interrupted");
    };

    info!(
        "Scan finished after {:?} ({}), {} controller(s) found",
        summary.elapsed, summary.reason, summary.found
    );
    Ok(summary)
}
