//! Recently used WyLight controllers.
//!
//! The store remembers controllers a user picked so a selection screen can
//! show them before, or without, a network scan.
//!
//! # Example
//!
//! ```no_run
//! use wylight_store::RecentStore;
//!
//! let store = RecentStore::open_default()?;
//! for endpoint in &store {
//!     println!("{}", endpoint);
//! }
//! # Ok::<(), wylight_store::Error>(())
//! ```

mod error;
mod models;
mod store;

pub use error::{Error, Result};
pub use store::RecentStore;

/// Default recent file path following platform conventions.
///
/// - Linux: `~/.local/share/wylight/recent.txt`
/// - macOS: `~/Library/Application Support/wylight/recent.txt`
/// - Windows: `C:\Users\<user>\AppData\Local\wylight\recent.txt`
pub fn default_recent_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("wylight")
        .join("recent.txt")
}
