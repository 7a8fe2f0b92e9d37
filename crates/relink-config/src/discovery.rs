//! File-based config discovery.
//!
//! Finds `relink.toml` in a project directory and layers it between the
//! built-in defaults and `RELINK_*` environment variables.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format as _, Serialized, Toml};
use tracing::debug;

use crate::config::{CONFIG_FILE, ENV_PREFIX, RelinkConfig};
use crate::error::{ConfigError, Result};

const ENV_KEYS: &[&str] = &[
    "root",
    "exclude",
    "external",
    "extensions",
    "module_extension",
    "reload_submodules",
];

/// Searches a directory for `relink.toml` and loads it.
///
/// # Example
///
/// ```no_run
/// use relink_config::ConfigDiscovery;
///
/// let config = ConfigDiscovery::new(".").load_or_default().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigDiscovery {
    root: PathBuf,
    env_prefix: String,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Read overrides from variables starting with `prefix` instead of `RELINK_`.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Path of the config file, if the directory has one.
    pub fn find(&self) -> Option<PathBuf> {
        let path = self.root.join(CONFIG_FILE);
        path.is_file().then_some(path)
    }

    /// Load the discovered config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the directory has no config file.
    pub fn load(&self) -> Result<RelinkConfig> {
        let path = self
            .find()
            .ok_or_else(|| ConfigError::NotFound(self.root.join(CONFIG_FILE)))?;
        self.load_from(&path)
    }

    /// Load the discovered config file, or defaults rooted at the search
    /// directory when there is none.
    pub fn load_or_default(&self) -> Result<RelinkConfig> {
        match self.find() {
            Some(path) => self.load_from(&path),
            None => {
                debug!(dir = %self.root.display(), "no config file, using defaults");
                self.extract(self.base_figment(), &self.root)
            }
        }
    }

    /// Load a specific config file.
    pub fn load_from(&self, path: &Path) -> Result<RelinkConfig> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        debug!(path = %path.display(), "loading config");

        let base = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let figment = Figment::new()
            .merge(Serialized::defaults(RelinkConfig::default()))
            .merge(Toml::file(path))
            .merge(self.env());
        self.extract(figment, base)
    }

    fn base_figment(&self) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(RelinkConfig::default()))
            .merge(self.env())
    }

    fn env(&self) -> Env {
        Env::prefixed(&self.env_prefix).only(ENV_KEYS)
    }

    fn extract(&self, figment: Figment, base: &Path) -> Result<RelinkConfig> {
        let mut config: RelinkConfig =
            figment.extract().map_err(|err| ConfigError::InvalidValue {
                field: err
                    .path
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "configuration".to_string()),
                hint: err.to_string(),
            })?;
        config.resolve_root(base);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn find_returns_none_without_config() {
        let dir = TempDir::new().unwrap();
        assert!(ConfigDiscovery::new(dir.path()).find().is_none());
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ConfigDiscovery::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(path) if path.ends_with(CONFIG_FILE)));
    }

    #[test]
    fn defaults_are_rooted_at_search_directory() {
        let dir = TempDir::new().unwrap();
        let config = ConfigDiscovery::new(dir.path())
            .with_env_prefix("RELINK_TEST_DEFAULTS_")
            .load_or_default()
            .unwrap();
        assert_eq!(config.root, dir.path().join("."));
        assert!(config.reload_submodules);
    }
}
