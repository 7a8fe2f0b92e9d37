use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::ModuleName;

/// Where a unit's code came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitOrigin {
    /// Executed from a source file on disk.
    File(PathBuf),
    /// Built-in, native or otherwise without an identifiable source.
    Unknown,
}

impl UnitOrigin {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Unknown => None,
        }
    }
}

/// What a top-level binding in a unit's namespace refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindingKind {
    /// The binding is a module (`import utils.helpers as helpers`).
    Module { target: ModuleName },
    /// A value that remembers the module defining it
    /// (`from models.wiki import WikiPage`).
    Symbol { defined_in: ModuleName },
    /// A local value without any module reference.
    Value,
}

/// A named entry of a unit's top-level namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    #[serde(flatten)]
    pub kind: BindingKind,
}

impl Binding {
    pub fn module(name: impl Into<String>, target: ModuleName) -> Self {
        Self {
            name: name.into(),
            kind: BindingKind::Module { target },
        }
    }

    pub fn symbol(name: impl Into<String>, defined_in: ModuleName) -> Self {
        Self {
            name: name.into(),
            kind: BindingKind::Symbol { defined_in },
        }
    }

    pub fn value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BindingKind::Value,
        }
    }

    /// The module this binding points at, if any.
    pub fn referenced_module(&self) -> Option<&ModuleName> {
        match &self.kind {
            BindingKind::Module { target } => Some(target),
            BindingKind::Symbol { defined_in } => Some(defined_in),
            BindingKind::Value => None,
        }
    }
}

/// The installed result of executing a module's source.
///
/// Units are immutable once built; a reload produces a new unit with a higher
/// generation and the registry swaps the whole `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleUnit {
    pub name: ModuleName,
    pub origin: UnitOrigin,
    /// Directory-level aggregator (`package/__init__`).
    pub is_package: bool,
    /// Exposes a host entry point (the unit can be loaded as an extension).
    pub entry_point: bool,
    pub bindings: Arc<Vec<Binding>>,
    /// Assigned by [`ModuleRegistry::install`](crate::ModuleRegistry::install).
    pub generation: u64,
}

impl ModuleUnit {
    /// Create a new unit builder. The origin defaults to [`UnitOrigin::Unknown`].
    pub fn builder(name: ModuleName) -> ModuleUnitBuilder {
        ModuleUnitBuilder {
            unit: Self {
                name,
                origin: UnitOrigin::Unknown,
                is_package: false,
                entry_point: false,
                bindings: Arc::new(Vec::new()),
                generation: 0,
            },
        }
    }

    /// Every module referenced from the namespace, in binding order.
    pub fn referenced_modules(&self) -> impl Iterator<Item = &ModuleName> {
        self.bindings.iter().filter_map(Binding::referenced_module)
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|binding| binding.name == name)
    }
}

/// Builder for `ModuleUnit`.
pub struct ModuleUnitBuilder {
    unit: ModuleUnit,
}

impl ModuleUnitBuilder {
    pub fn origin(mut self, origin: UnitOrigin) -> Self {
        self.unit.origin = origin;
        self
    }

    pub fn file(self, path: impl Into<PathBuf>) -> Self {
        self.origin(UnitOrigin::File(path.into()))
    }

    pub fn package(mut self, is_package: bool) -> Self {
        self.unit.is_package = is_package;
        self
    }

    pub fn entry_point(mut self, entry_point: bool) -> Self {
        self.unit.entry_point = entry_point;
        self
    }

    pub fn binding(mut self, binding: Binding) -> Self {
        Arc::make_mut(&mut self.unit.bindings).push(binding);
        self
    }

    pub fn bindings(mut self, bindings: Vec<Binding>) -> Self {
        self.unit.bindings = Arc::new(bindings);
        self
    }

    pub fn build(self) -> ModuleUnit {
        self.unit
    }
}
