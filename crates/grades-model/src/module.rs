//! Module names offered to the report filter.

use std::fmt;

use serde::Serialize;

/// Distinct module names of a Modules document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleCatalog {
    names: Vec<String>,
}

impl ModuleCatalog {
    /// Build a catalog, trimming names and skipping blanks and duplicates.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Self::default();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || catalog.contains(name) {
                continue;
            }
            catalog.names.push(name.to_string());
        }
        catalog
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|known| known == name)
    }

    /// Pick a module by its 1-based menu position.
    pub fn select(&self, position: usize) -> Option<ModuleFilter> {
        position
            .checked_sub(1)
            .and_then(|idx| self.names.get(idx))
            .map(|name| ModuleFilter(name.clone()))
    }

    /// Filter for a module name, only if the catalog knows it.
    pub fn filter_for(&self, name: &str) -> Option<ModuleFilter> {
        let name = name.trim();
        self.names
            .iter()
            .find(|known| known.as_str() == name)
            .map(|known| ModuleFilter(known.clone()))
    }
}

/// A module name known to be a member of a [`ModuleCatalog`].
///
/// Only the catalog hands these out, so the report stage never sees a value
/// outside the set present in the Modules document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModuleFilter(String);

impl ModuleFilter {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModuleFilter {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
