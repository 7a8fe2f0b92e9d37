//! Command-line interface definition for relink.
//!
//! # Command Structure
//!
//! - `relink graph <MODULE>` - Show the dependency graph of a module
//! - `relink plan <MODULE>` - Show the order a reload would run in
//! - `relink reload <EXTENSION>` - Reload an extension and its dependencies
//! - `relink check` - Validate the configuration and load every extension

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use relink_graph::ModuleName;

/// relink - dependency-ordered, all-or-nothing module reloads
#[derive(Parser, Debug)]
#[command(
    name = "relink",
    version,
    about = "Dependency-ordered, all-or-nothing module reloads",
    long_about = "relink works out which of a host's own modules an extension depends on,\n\
                  orders them so every dependency is refreshed before its dependents,\n\
                  and reloads them as one transaction that is rolled back on failure."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to relink.toml (defaults to <cwd>/relink.toml when present)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Project directory
    #[arg(long, global = true, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
}

impl Cli {
    pub fn globals(&self) -> GlobalArgs {
        GlobalArgs {
            config: self.config.clone(),
            cwd: self.cwd.clone(),
        }
    }
}

/// Available relink subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the dependency graph of a module
    ///
    /// Lists every reloadable module reachable from MODULE with its depth and
    /// the modules it references directly.
    Graph(GraphArgs),

    /// Show the reload order for a module
    ///
    /// Dependencies come first; the module itself comes last and is reloaded
    /// by the extension host.
    Plan(PlanArgs),

    /// Reload an extension
    ///
    /// Loads the configured extensions, then reloads EXTENSION. Its
    /// dependencies are reloaded first unless --no-submodules is given.
    Reload(ReloadArgs),

    /// Validate configuration and load every extension
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Module to start from (e.g. cogs.genshin.gapi)
    #[arg(value_name = "MODULE")]
    pub module: ModuleName,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Module to plan a reload for
    #[arg(value_name = "MODULE")]
    pub module: ModuleName,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ReloadArgs {
    /// Extension to reload
    #[arg(value_name = "EXTENSION")]
    pub extension: ModuleName,

    /// Only reload the extension itself, not its dependencies
    #[arg(long)]
    pub no_submodules: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Only validate the configuration, do not load extensions
    #[arg(long)]
    pub config_only: bool,
}
