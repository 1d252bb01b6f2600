//! Utility functions for CLI operations.

use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use wylight_core::EndpointList;
use wylight_store::RecentStore;

/// How the user named a controller on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Position in the listed order.
    Index(usize),
    /// Full control address.
    Address(SocketAddr),
    /// IP only; the first listed controller on that host.
    Ip(IpAddr),
}

impl std::str::FromStr for Target {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(index) = s.parse() {
            Ok(Self::Index(index))
        } else if let Ok(address) = s.parse() {
            Ok(Self::Address(address))
        } else if let Ok(ip) = s.parse() {
            Ok(Self::Ip(ip))
        } else {
            bail!(
                "'{}' is neither a list index nor an address.\n\
                 Use the # column of 'wylight scan' or an address like 192.168.0.14:2000.",
                s
            )
        }
    }
}

impl Target {
    /// Position of the target in `list`.
    pub fn position(&self, list: &EndpointList) -> Option<usize> {
        match self {
            Self::Index(index) => (*index < list.len()).then_some(*index),
            Self::Address(address) => list.position(address),
            Self::Ip(ip) => list.iter().position(|e| e.ip() == *ip),
        }
    }
}

/// Open the recent file, with context on failure.
pub fn open_store(path: &Path) -> Result<RecentStore> {
    RecentStore::open(path)
        .with_context(|| format!("Failed to read recent controllers from {}", path.display()))
}

/// Write output to file or stdout.
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}
