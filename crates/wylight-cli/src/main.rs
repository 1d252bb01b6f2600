//! Command-line interface for WyLight lighting controllers.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scan` | Listen for WiFly broadcasts and list controllers |
//! | `recent` | List recently used controllers |
//! | `select` | Pick a controller and remember it |
//! | `config` | Manage CLI configuration |
//! | `completions` | Generate shell completions |
//!
//! # Environment Variables
//!
//! - `WYLIGHT_RECENT`: recently used controllers file (overridden by `--recent`)
//! - `WYLIGHT_CONFIG`: config file location
//! - `NO_COLOR`: Disable colored output when set

use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod format;
mod style;
mod util;

use cli::{Cli, Commands};
use commands::{SelectArgs, cmd_config, cmd_recent, cmd_scan, cmd_select};
use config::{Config, resolve_format, resolve_recent_path};
use format::FormatOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "wylight", &mut io::stdout());
        return Ok(());
    }

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = Config::load();
    let recent = resolve_recent_path(cli.recent.as_deref(), &config);
    let base_opts = FormatOptions::new(cli.no_color || config.no_color, cli.style)
        .with_compact(cli.compact);
    let output = cli.output.as_ref();

    match cli.command {
        Commands::Scan { scan, output: out } => {
            let format = resolve_format(out.format, cli.json, &config);
            let opts = base_opts.with_no_header(out.no_header);
            cmd_scan(&scan, format, output, &recent, cli.quiet, &opts, &config).await
        }
        Commands::Recent { output: out, prune } => {
            let format = resolve_format(out.format, cli.json, &config);
            let opts = base_opts.with_no_header(out.no_header);
            cmd_recent(&recent, prune, format, output, &opts)
        }
        Commands::Select {
            target,
            scan,
            scan_args,
            output: out,
        } => {
            let format = resolve_format(out.format, cli.json, &config);
            let opts = base_opts.with_no_header(out.no_header);
            let args = SelectArgs {
                target: &target,
                scan,
                scan_args: &scan_args,
                recent,
            };
            cmd_select(args, format, output, cli.quiet, &opts, &config).await
        }
        Commands::Config { action } => cmd_config(action, cli.quiet),
        Commands::Completions { .. } => {
            // Already handled above
            unreachable!()
        }
    }
}
