use std::path::{Path, PathBuf};

use relink_graph::{Boundary, ModuleName};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE: &str = "relink.toml";

/// Prefix of environment variables overriding file values.
pub const ENV_PREFIX: &str = "RELINK_";

/// Host configuration (`relink.toml`).
///
/// ```toml
/// root = "."
/// exclude = ["utils.bot", "utils.reload"]
/// external = ["disnake", "aiohttp"]
/// extensions = ["cogs.genshin.gapi"]
/// module_extension = "toml"
/// reload_submodules = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelinkConfig {
    /// Host source tree. Relative paths are resolved against the directory
    /// holding the config file.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Modules under the root that are never reloaded.
    #[serde(default)]
    pub exclude: Vec<ModuleName>,

    /// Third-party modules the host provides without source files.
    #[serde(default)]
    pub external: Vec<ModuleName>,

    /// Extensions loaded at start-up.
    #[serde(default)]
    pub extensions: Vec<ModuleName>,

    /// Extension of module source files.
    #[serde(default = "default_module_extension")]
    pub module_extension: String,

    /// Whether `reload` refreshes an extension's dependencies by default.
    #[serde(default = "default_reload_submodules")]
    pub reload_submodules: bool,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_module_extension() -> String {
    "toml".to_string()
}

fn default_reload_submodules() -> bool {
    true
}

impl Default for RelinkConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude: Vec::new(),
            external: Vec::new(),
            extensions: Vec::new(),
            module_extension: default_module_extension(),
            reload_submodules: default_reload_submodules(),
        }
    }
}

impl RelinkConfig {
    /// Resolve a relative `root` against `base`.
    pub fn resolve_root(&mut self, base: &Path) {
        if self.root.is_relative() {
            self.root = base.join(&self.root);
        }
    }

    /// The reload boundary described by this configuration.
    pub fn boundary(&self) -> Boundary {
        Boundary::new(&self.root).exclude_all(self.exclude.iter().cloned())
    }

    /// Check values that deserialization cannot.
    pub fn validate(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(ConfigError::RootNotFound(self.root.clone()));
        }

        let extension = self.module_extension.trim();
        if extension.is_empty() || extension.contains('.') || extension != self.module_extension {
            return Err(ConfigError::InvalidValue {
                field: "module_extension".to_string(),
                hint: format!(
                    "expected a bare file extension such as \"toml\", got {:?}",
                    self.module_extension
                ),
            });
        }

        if let Some(module) = self.external.iter().find(|module| self.exclude.contains(module)) {
            return Err(ConfigError::InvalidValue {
                field: "exclude".to_string(),
                hint: format!("`{module}` is listed as both external and excluded"),
            });
        }

        Ok(())
    }
}
