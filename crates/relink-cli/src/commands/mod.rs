//! Command implementations for the relink CLI.
//!
//! - [`graph`] - Dependency graph of a module
//! - [`plan`] - Reload order of a module
//! - [`reload`] - Reload an extension
//! - [`check`] - Configuration and extension validation
//!
//! Each command provides an `execute` function taking its parsed arguments
//! and the global options.

pub mod check;
pub mod graph;
pub mod plan;
pub mod reload;
pub(crate) mod utils;

pub use check::execute as check_execute;
pub use graph::execute as graph_execute;
pub use plan::execute as plan_execute;
pub use reload::execute as reload_execute;
