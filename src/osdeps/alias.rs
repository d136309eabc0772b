//! Alternate package names.

use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

static GLOBAL_ALIASES: LazyLock<RwLock<AliasTable>> =
    LazyLock::new(|| RwLock::new(AliasTable::default()));

/// Maps alternate names to the canonical name used in rule databases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `alias` as another name for `canonical`.
    pub fn register(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.aliases.insert(alias.into(), canonical.into());
    }

    /// Substitute `name` once. Names without an alias pass through.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Snapshot of the process-wide table.
    pub fn global() -> Self {
        GLOBAL_ALIASES
            .read()
            .map(|table| table.clone())
            .unwrap_or_default()
    }
}

impl<A, C> FromIterator<(A, C)> for AliasTable
where
    A: Into<String>,
    C: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (A, C)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (alias, canonical) in iter {
            table.register(alias, canonical);
        }
        table
    }
}

/// Register an alias in the process-wide table.
///
/// Resolvers copy this table when they are built, later registrations do
/// not affect existing resolvers.
pub fn register_global(alias: impl Into<String>, canonical: impl Into<String>) {
    if let Ok(mut table) = GLOBAL_ALIASES.write() {
        table.register(alias, canonical);
    }
}

/// Drop every process-wide alias.
pub fn clear_global() {
    if let Ok(mut table) = GLOBAL_ALIASES.write() {
        *table = AliasTable::default();
    }
}
