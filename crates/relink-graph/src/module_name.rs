use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Errors produced when parsing a [`ModuleName`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModuleNameError {
    #[error("module name is empty")]
    Empty,

    #[error("module name `{0}` contains an empty segment")]
    EmptySegment(String),

    #[error("module name `{0}` contains whitespace")]
    Whitespace(String),
}

/// Stable, hierarchical identifier of a module (`cogs.genshin.gapi`).
///
/// Names are compared by value and are cheap to clone, so they double as the
/// key of every map in the crate.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleName(Arc<str>);

impl ModuleName {
    /// Parse and validate a dotted module name.
    pub fn new(name: impl AsRef<str>) -> Result<Self, ModuleNameError> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(ModuleNameError::Empty);
        }
        if name.chars().any(char::is_whitespace) {
            return Err(ModuleNameError::Whitespace(name.to_string()));
        }
        if name.split('.').any(str::is_empty) {
            return Err(ModuleNameError::EmptySegment(name.to_string()));
        }
        Ok(Self(Arc::from(name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the dot-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Name of the enclosing package, if any.
    pub fn parent(&self) -> Option<ModuleName> {
        self.0
            .rsplit_once('.')
            .map(|(parent, _)| Self(Arc::from(parent)))
    }

    /// True when `self` equals `other` or lives below it in the hierarchy.
    ///
    /// `cogs.genshin` is within `cogs`, `cogsx` is not.
    pub fn is_within(&self, other: &ModuleName) -> bool {
        match self.0.strip_prefix(other.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with('.'),
            None => false,
        }
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleName({})", self.0)
    }
}

impl FromStr for ModuleName {
    type Err = ModuleNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ModuleName {
    type Error = ModuleNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ModuleName> for String {
    fn from(value: ModuleName) -> Self {
        value.0.to_string()
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ModuleName {
        ModuleName::new(s).unwrap()
    }

    #[test]
    fn rejects_malformed_names() {
        assert_eq!(ModuleName::new(""), Err(ModuleNameError::Empty));
        assert!(matches!(
            ModuleName::new("cogs..gapi"),
            Err(ModuleNameError::EmptySegment(_))
        ));
        assert!(matches!(
            ModuleName::new(".cogs"),
            Err(ModuleNameError::EmptySegment(_))
        ));
        assert!(matches!(
            ModuleName::new("cogs. gapi"),
            Err(ModuleNameError::Whitespace(_))
        ));
    }

    #[test]
    fn parent_and_segments() {
        let gapi = name("cogs.genshin.gapi");
        assert_eq!(gapi.parent(), Some(name("cogs.genshin")));
        assert_eq!(name("main").parent(), None);
        assert_eq!(gapi.segments().collect::<Vec<_>>(), ["cogs", "genshin", "gapi"]);
    }

    #[test]
    fn is_within_respects_segment_boundaries() {
        let cogs = name("cogs");
        assert!(name("cogs").is_within(&cogs));
        assert!(name("cogs.genshin.gapi").is_within(&cogs));
        assert!(!name("cogsx").is_within(&cogs));
        assert!(!cogs.is_within(&name("cogs.genshin")));
    }

    #[test]
    fn serde_uses_plain_strings() {
        let json = serde_json::to_string(&name("utils.helpers")).unwrap();
        assert_eq!(json, "\"utils.helpers\"");

        let parsed: ModuleName = serde_json::from_str("\"models.wiki\"").unwrap();
        assert_eq!(parsed, name("models.wiki"));
        assert!(serde_json::from_str::<ModuleName>("\"bad..name\"").is_err());
    }
}
