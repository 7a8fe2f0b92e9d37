//! # relink-config
//!
//! Configuration for relink hosts: the `relink.toml` model, its discovery
//! and layered loading (defaults, then the file, then `RELINK_*`
//! environment variables).

pub mod config;
pub mod discovery;
pub mod error;

pub use config::{CONFIG_FILE, ENV_PREFIX, RelinkConfig};
pub use discovery::ConfigDiscovery;
pub use error::{ConfigError, Result};
