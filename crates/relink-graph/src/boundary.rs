use std::path::{Path, PathBuf};

use path_clean::PathClean;
use rustc_hash::FxHashSet as HashSet;

use super::{ModuleName, ModuleUnit};

/// Decides which units belong to the host's own source tree.
///
/// Everything outside `root`, everything without a source file and every
/// excluded name is treated as third-party code that is never reloaded.
#[derive(Debug, Clone)]
pub struct Boundary {
    root: PathBuf,
    excluded: HashSet<ModuleName>,
}

impl Boundary {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().clean(),
            excluded: HashSet::default(),
        }
    }

    /// Never reload `name`, even though it lives under the root.
    ///
    /// Used for the modules that drive reloading themselves.
    pub fn exclude(mut self, name: ModuleName) -> Self {
        self.excluded.insert(name);
        self
    }

    pub fn exclude_all<I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = ModuleName>,
    {
        self.excluded.extend(names);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_excluded(&self, name: &ModuleName) -> bool {
        self.excluded.contains(name)
    }

    pub fn is_reloadable(&self, unit: &ModuleUnit) -> bool {
        let Some(path) = unit.origin.path() else {
            return false;
        };
        if self.is_excluded(&unit.name) {
            return false;
        }
        path.clean().starts_with(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnitOrigin;

    fn name(s: &str) -> ModuleName {
        ModuleName::new(s).unwrap()
    }

    fn file_unit(module: &str, path: &str) -> ModuleUnit {
        ModuleUnit::builder(name(module)).file(path).build()
    }

    #[test]
    fn units_under_root_are_reloadable() {
        let boundary = Boundary::new("/srv/bot");
        assert!(boundary.is_reloadable(&file_unit("utils.helpers", "/srv/bot/utils/helpers.toml")));
        assert!(!boundary.is_reloadable(&file_unit("aiohttp", "/usr/lib/site/aiohttp.toml")));
    }

    #[test]
    fn lexical_tricks_do_not_escape_the_root() {
        let boundary = Boundary::new("/srv/bot/");
        assert!(!boundary.is_reloadable(&file_unit("x", "/srv/bot/../other/x.toml")));
        assert!(!boundary.is_reloadable(&file_unit("x", "/srv/botx/x.toml")));
        assert!(boundary.is_reloadable(&file_unit("x", "/srv/bot/./cogs/../x.toml")));
    }

    #[test]
    fn units_without_origin_are_not_reloadable() {
        let boundary = Boundary::new("/srv/bot");
        let unit = ModuleUnit::builder(name("builtins"))
            .origin(UnitOrigin::Unknown)
            .build();
        assert!(!boundary.is_reloadable(&unit));
    }

    #[test]
    fn excluded_modules_are_not_reloadable() {
        let boundary = Boundary::new("/srv/bot").exclude_all([name("utils.bot"), name("utils.reload")]);
        assert!(!boundary.is_reloadable(&file_unit("utils.reload", "/srv/bot/utils/reload.toml")));
        assert!(boundary.is_reloadable(&file_unit("utils.helpers", "/srv/bot/utils/helpers.toml")));
    }
}
