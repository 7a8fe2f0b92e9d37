//! File-backed module sources.
//!
//! A module `a.b.c` lives at `<root>/a/b/c.<ext>` and a package `a.b` at
//! `<root>/a/b/__init__.<ext>`. Every source file is a TOML manifest:
//!
//! ```toml
//! entry_point = true
//!
//! [[bind]]
//! name = "helpers"
//! module = "utils.helpers"      # the binding is a module
//!
//! [[bind]]
//! name = "WikiPage"
//! from = "cogs.mihoyo.wiki.models"  # a symbol defined in another module
//!
//! [[bind]]
//! name = "EMBED_COLOR"          # a plain value
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use relink_config::{CONFIG_FILE, RelinkConfig};
use relink_graph::{
    Binding, BoxError, ModuleName, ModuleRegistry, ModuleSource, ModuleUnit, SourceLoader,
};
use rustc_hash::FxHashSet as HashSet;
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::HostError;

/// File stem of package aggregator sources.
pub const PACKAGE_STEM: &str = "__init__";

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("binding `{0}` sets both `module` and `from`")]
    AmbiguousBinding(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default)]
    entry_point: bool,
    #[serde(default)]
    bind: Vec<ManifestBinding>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestBinding {
    name: String,
    module: Option<ModuleName>,
    from: Option<ModuleName>,
}

impl Manifest {
    fn read(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn bindings(self) -> Result<Vec<Binding>, ManifestError> {
        self.bind
            .into_iter()
            .map(|binding| match (binding.module, binding.from) {
                (Some(target), None) => Ok(Binding::module(binding.name, target)),
                (None, Some(defined_in)) => Ok(Binding::symbol(binding.name, defined_in)),
                (None, None) => Ok(Binding::value(binding.name)),
                (Some(_), Some(_)) => Err(ManifestError::AmbiguousBinding(binding.name)),
            })
            .collect()
    }
}

/// [`SourceLoader`] reading manifests from a source tree.
#[derive(Debug, Clone)]
pub struct FileSourceLoader {
    root: PathBuf,
    extension: String,
    external: HashSet<ModuleName>,
}

impl FileSourceLoader {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            external: HashSet::default(),
        }
    }

    pub fn from_config(config: &RelinkConfig) -> Self {
        Self::new(&config.root, &config.module_extension)
            .with_external(config.external.iter().cloned())
    }

    /// Modules the host provides without a source file.
    pub fn with_external<I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = ModuleName>,
    {
        self.external.extend(names);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn module_path(&self, name: &ModuleName) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(name.segments());
        path.set_extension(&self.extension);
        path
    }

    pub fn package_path(&self, name: &ModuleName) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(name.segments());
        path.push(PACKAGE_STEM);
        path.set_extension(&self.extension);
        path
    }
}

impl SourceLoader for FileSourceLoader {
    fn locate(&self, name: &ModuleName) -> Option<ModuleSource> {
        if self.external.contains(name) {
            return Some(ModuleSource::new(name.clone(), None));
        }

        let package = self.package_path(name);
        if package.is_file() {
            return Some(ModuleSource::new(name.clone(), Some(package)).package(true));
        }
        let module = self.module_path(name);
        module
            .is_file()
            .then(|| ModuleSource::new(name.clone(), Some(module)))
    }

    fn execute(
        &self,
        source: &ModuleSource,
        _registry: &ModuleRegistry,
    ) -> Result<ModuleUnit, BoxError> {
        let Some(path) = &source.path else {
            return Ok(ModuleUnit::builder(source.name.clone()).build());
        };

        let manifest = Manifest::read(path)?;
        let entry_point = manifest.entry_point;
        let unit = ModuleUnit::builder(source.name.clone())
            .file(path)
            .package(source.is_package)
            .entry_point(entry_point)
            .bindings(manifest.bindings()?)
            .build();
        debug!(module = %unit.name, bindings = unit.bindings.len(), "executed manifest");
        Ok(unit)
    }
}

/// A module source found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredModule {
    pub name: ModuleName,
    pub path: PathBuf,
    pub is_package: bool,
    pub entry_point: bool,
}

impl DiscoveredModule {
    /// Whether any segment is dunder-private (`cogs.genshin.__gapi.api`).
    pub fn is_private(&self) -> bool {
        self.name.segments().any(|segment| segment.starts_with("__"))
    }

    /// Whether the host should offer this module as an extension.
    pub fn is_extension_candidate(&self) -> bool {
        self.entry_point && !self.is_package && !self.is_private()
    }
}

/// Walk `root` for module sources, sorted by module name.
///
/// Files whose path is not a valid module name are skipped, as are manifests
/// that fail to parse (they are reported when loaded).
pub fn discover_modules(root: &Path, extension: &str) -> Result<Vec<DiscoveredModule>, HostError> {
    let mut modules = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|ext| ext.to_str()) != Some(extension)
        {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        if relative == Path::new(CONFIG_FILE) {
            continue;
        }

        let mut segments: Vec<String> = relative
            .with_extension("")
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect();
        let is_package = segments.last().is_some_and(|stem| stem == PACKAGE_STEM);
        if is_package {
            segments.pop();
        }

        let name = match ModuleName::new(segments.join(".")) {
            Ok(name) => name,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "skipping non-module file");
                continue;
            }
        };

        let entry_point = match Manifest::read(path) {
            Ok(manifest) => manifest.entry_point,
            Err(err) => {
                warn!(module = %name, error = %err, "unreadable manifest");
                false
            }
        };

        modules.push(DiscoveredModule {
            name,
            path: path.to_path_buf(),
            is_package,
            entry_point,
        });
    }

    modules.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(modules)
}
