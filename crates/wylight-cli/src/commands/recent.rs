//! Recent command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_recent_json, format_recent_text, format_scan_csv};
use crate::util::{open_store, write_output};

pub fn cmd_recent(
    recent: &Path,
    prune: bool,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let mut store = open_store(recent)?;
    if store.skipped() > 0 {
        warn!(
            "Skipped {} unreadable line(s) in {}",
            store.skipped(),
            store.path().display()
        );
    }

    if prune && recent.exists() {
        store
            .compact()
            .with_context(|| format!("Failed to rewrite {}", recent.display()))?;
    }

    let endpoints: Vec<_> = store.iter().cloned().collect();
    let content = match format {
        OutputFormat::Json => format_recent_json(&endpoints, opts)?,
        OutputFormat::Text => format_recent_text(&endpoints, opts),
        OutputFormat::Csv => format_scan_csv(&endpoints, opts),
    };
    write_output(output, &content)
}
