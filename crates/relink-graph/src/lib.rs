//! # relink-graph
//!
//! Dependency-ordered, transactional reloading of a host's own modules.
//!
//! When an extension is reloaded, the modules it references from the host's
//! source tree are stale too. This crate works out which of them to re-execute
//! and in what order, then re-executes them all or none.
//!
//! ## Architecture
//!
//! ```text
//!        ModuleRegistry  (name -> Arc<ModuleUnit>)
//!              │
//!              ▼
//!   DependencyGraph::build ◄── Boundary (what counts as host code)
//!              │
//!              ▼
//!         linearize  (C3 merge, dependencies first)
//!              │
//!              ▼
//!      ReloadTransaction ◄── SourceLoader (host hook)
//!         │         │
//!     Committed  RolledBack (registry restored)
//! ```
//!
//! [`Reloader`] wires these together and exposes the two host-facing
//! operations, [`Reloader::prepare_reload`] and [`Reloader::execute_reload`].
//! The root module itself is never re-executed here; the host reloads it
//! once its children are fresh.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::path::PathBuf;
//!
//! use relink_graph::{
//!     Binding, Boundary, BoxError, ModuleName, ModuleRegistry, ModuleSource, ModuleUnit,
//!     Reloader, SourceLoader,
//! };
//!
//! /// `cogs.gapi` imports `utils.helpers`.
//! struct Bot;
//!
//! impl SourceLoader for Bot {
//!     fn locate(&self, name: &ModuleName) -> Option<ModuleSource> {
//!         let path = PathBuf::from(format!("/srv/bot/{}.toml", name.as_str().replace('.', "/")));
//!         matches!(name.as_str(), "cogs.gapi" | "utils.helpers")
//!             .then(|| ModuleSource::new(name.clone(), Some(path)))
//!     }
//!
//!     fn execute(&self, source: &ModuleSource, _: &ModuleRegistry) -> Result<ModuleUnit, BoxError> {
//!         let mut unit = ModuleUnit::builder(source.name.clone());
//!         if let Some(path) = &source.path {
//!             unit = unit.file(path.clone());
//!         }
//!         if source.name.as_str() == "cogs.gapi" {
//!             unit = unit.binding(Binding::module("helpers", "utils.helpers".parse()?));
//!         }
//!         Ok(unit.build())
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let reloader = Reloader::new(Boundary::new("/srv/bot"), Bot);
//! let root: ModuleName = "cogs.gapi".parse()?;
//! reloader.load(&root)?;
//!
//! let order = reloader.prepare_reload(&root)?;
//! let helpers: ModuleName = "utils.helpers".parse()?;
//! assert_eq!(order.dependencies(), [helpers]);
//!
//! let report = reloader.execute_reload(&order)?;
//! assert_eq!(report.reloaded.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! The registry is behind a `parking_lot::RwLock` and entries are replaced as
//! whole `Arc`s, so concurrent readers see either the old or the new unit.
//! Reload transactions assume a single writer; hosts serialize them.

mod boundary;
mod error;
mod graph;
mod linearize;
mod module_name;
mod registry;
mod reloader;
mod transaction;
mod unit;

pub use boundary::Boundary;
pub use error::{BoxError, ReloadError, Result};
pub use graph::{DependencyGraph, ModuleRecord};
pub use linearize::{LinearOrder, linearize};
pub use module_name::{ModuleName, ModuleNameError};
pub use registry::{ModuleRegistry, RegistrySnapshot};
pub use reloader::Reloader;
pub use transaction::{
    ModuleSource, ReloadReport, ReloadTransaction, SourceLoader, TransactionState,
};
pub use unit::{Binding, BindingKind, ModuleUnit, ModuleUnitBuilder, UnitOrigin};

// Test utilities (available in test builds and with the test-utils feature)
#[cfg(any(test, doctest, feature = "test-utils"))]
pub mod test_utils;

#[cfg(test)]
mod tests;
