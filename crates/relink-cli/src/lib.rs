//! relink CLI library.
//!
//! Exposes the pieces of the `relink` binary so they can be tested and reused:
//! argument parsing, command implementations, the file-backed extension host,
//! error reporting, logging and terminal output.
//!
//! Modules are described by manifest files under the configured root, one per
//! module (`cogs/admin.toml`) or package (`cogs/__init__.toml`):
//!
//! ```toml
//! entry_point = true
//!
//! [[bind]]
//! name = "helpers"
//! module = "utils.helpers"
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod host;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result};
