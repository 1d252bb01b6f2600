//! CLI argument definitions using clap.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Visual styling mode for output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StyleMode {
    /// Tables with borders and colors (default)
    #[default]
    Rich,
    /// Plain text with no decorations (for scripting)
    Plain,
}

/// Reusable scan arguments
#[derive(Debug, Clone, Default, Args)]
pub struct ScanArgs {
    /// Scan duration in milliseconds [default: 3000]
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// UDP port WiFly modules broadcast to [default: 55555]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Local IPv4 address to listen on [default: 0.0.0.0]
    #[arg(short, long)]
    pub bind: Option<Ipv4Addr>,
}

/// Reusable output format arguments
#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    /// Output format [default: text]
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Omit header row in CSV output (useful for appending)
    #[arg(long)]
    pub no_header: bool,
}

#[derive(Parser)]
#[command(name = "wylight")]
#[command(author, version, about = "Find and select WyLight controllers on the local network", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as JSON (shorthand for --format json)
    #[arg(long, global = true)]
    pub json: bool,

    /// Output compact JSON (no pretty-printing)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Visual styling mode (rich, plain)
    #[arg(
        long,
        global = true,
        value_enum,
        default_value = "rich",
        env = "WYLIGHT_STYLE"
    )]
    pub style: StyleMode,

    /// Recently used controllers file
    #[arg(long, global = true, env = "WYLIGHT_RECENT")]
    pub recent: Option<PathBuf>,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan for WyLight controllers, listing recently used ones too
    Scan {
        #[command(flatten)]
        scan: ScanArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List recently used controllers
    Recent {
        #[command(flatten)]
        output: OutputArgs,

        /// Rewrite the recent file with one line per controller
        #[arg(long)]
        prune: bool,
    },

    /// Select a controller and remember it as recently used
    Select {
        /// List index, address (IP:PORT) or IP of the controller
        target: String,

        /// Scan before selecting so indexes match a fresh `wylight scan`
        #[arg(short, long)]
        scan: bool,

        #[command(flatten)]
        scan_args: ScanArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Configuration keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigKey {
    /// UDP broadcast port
    Port,
    /// Local IPv4 address to listen on
    BindAddress,
    /// Scan duration in milliseconds
    TimeoutMs,
    /// Recently used controllers file
    RecentFile,
    /// Default output format
    Format,
    /// Disable colored output
    NoColor,
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Get a configuration value
    Get {
        /// Configuration key
        #[arg(value_enum)]
        key: ConfigKey,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_enum)]
        key: ConfigKey,
        /// Configuration value
        value: String,
    },

    /// Reset a configuration value to its default
    Unset {
        /// Configuration key to reset
        #[arg(value_enum)]
        key: ConfigKey,
    },

    /// Show configuration file path
    Path,
}

/// Parse a boolean config value.
pub fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(format!(
            "Invalid boolean value '{}'. Use: true/false, yes/no, on/off, 1/0",
            s
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan_flags() {
        let cli = Cli::try_parse_from([
            "wylight", "scan", "--timeout", "1500", "--port", "4000", "--bind", "10.0.0.2",
            "--format", "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Scan { scan, output } => {
                assert_eq!(scan.timeout, Some(1500));
                assert_eq!(scan.port, Some(4000));
                assert_eq!(scan.bind, Some(Ipv4Addr::new(10, 0, 0, 2)));
                assert_eq!(output.format, Some(OutputFormat::Json));
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn test_parse_select() {
        let cli = Cli::try_parse_from(["wylight", "select", "2", "--scan", "-t", "500"]).unwrap();
        match cli.command {
            Commands::Select {
                target,
                scan,
                scan_args,
                ..
            } => {
                assert_eq!(target, "2");
                assert!(scan);
                assert_eq!(scan_args.timeout, Some(500));
            }
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("yes"), Ok(true));
        assert_eq!(parse_bool("OFF"), Ok(false));
        assert!(parse_bool("maybe").is_err());
    }
}
