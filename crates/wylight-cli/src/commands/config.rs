//! Config command implementation.

use anyhow::Result;

use crate::cli::{ConfigAction, ConfigKey};
use crate::config::Config;

const ALL_KEYS: [(ConfigKey, &str); 6] = [
    (ConfigKey::Port, "port"),
    (ConfigKey::BindAddress, "bind_address"),
    (ConfigKey::TimeoutMs, "timeout_ms"),
    (ConfigKey::RecentFile, "recent_file"),
    (ConfigKey::Format, "format"),
    (ConfigKey::NoColor, "no_color"),
];

pub fn cmd_config(action: ConfigAction, quiet: bool) -> Result<()> {
    let path = Config::path();
    match action {
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Show => {
            let config = Config::load();
            if !quiet {
                println!("# {}", path.display());
            }
            for (key, name) in ALL_KEYS {
                println!("{} = {}", name, config.get(key));
            }
        }
        ConfigAction::Get { key } => println!("{}", Config::load().get(key)),
        ConfigAction::Set { key, value } => {
            let mut config = Config::load();
            config.set(key, &value)?;
            config.save()?;
            if !quiet {
                eprintln!("Set {} = {}", key_name(key), config.get(key));
            }
        }
        ConfigAction::Unset { key } => {
            let mut config = Config::load();
            config.unset(key);
            config.save()?;
            if !quiet {
                eprintln!("Reset {} to {}", key_name(key), config.get(key));
            }
        }
    }
    Ok(())
}

fn key_name(key: ConfigKey) -> &'static str {
    ALL_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map_or("?", |(_, name)| name)
}
