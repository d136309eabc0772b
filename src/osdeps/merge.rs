//! Merging rule databases into a resolver.

use serde::Serialize;
use serde_json::json;

use super::database::RuleDatabase;
use super::error::ConfigError;
use super::matcher::ManagerResolution;
use super::resolver::OsPackageResolver;
use crate::ui::prelude::*;

/// A name whose new definition resolves differently on the active OS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeConflict {
    pub name: String,
    pub previous_source: String,
    pub new_source: String,
    pub previous: Vec<ManagerResolution>,
    pub new: Vec<ManagerResolution>,
}

impl MergeConflict {
    pub fn message(&self) -> String {
        format!(
            "osdeps definition for {}, previously defined in {} overridden by {}: resolves to {} instead of {}",
            self.name,
            self.previous_source,
            self.new_source,
            describe(&self.new),
            describe(&self.previous)
        )
    }
}

fn describe(resolution: &[ManagerResolution]) -> String {
    if resolution.is_empty() {
        return "nothing on this OS".to_string();
    }
    resolution
        .iter()
        .map(|entry| {
            if entry.is_nonexistent() {
                format!("{}: nonexistent", entry.manager)
            } else if entry.packages.is_empty() {
                format!("{}: ignore", entry.manager)
            } else {
                format!("{}: {}", entry.manager, entry.packages.join(", "))
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl OsPackageResolver {
    /// Merge `other` into this resolver's database. Definitions in `other`
    /// win; the sources they replace stay in the entry history.
    ///
    /// Names defined on both sides with different rules are resolved for the
    /// active OS. When the results differ a warning is emitted and the
    /// conflict is returned. Nothing is changed if `other` is invalid.
    pub fn merge(&mut self, other: &RuleDatabase) -> Result<Vec<MergeConflict>, ConfigError> {
        other.validate(&self.managers)?;

        let mut merged = self.database.clone();
        let mut conflicts = Vec::new();

        for (name, entry) in other.iter() {
            if let Some(existing) = self.database.get(name)
                && existing.rule != entry.rule
            {
                let previous = self.resolve_in(&self.database, name).unwrap_or_default();
                let new = self.resolve_in(other, name).unwrap_or_default();
                if previous != new {
                    conflicts.push(MergeConflict {
                        name: name.to_string(),
                        previous_source: existing.source.clone(),
                        new_source: entry.source.clone(),
                        previous,
                        new,
                    });
                }
            }
            merged.insert_entry(name, entry);
        }

        for conflict in &conflicts {
            emit(
                Level::Warn,
                "osdeps.merge.conflict",
                &conflict.message(),
                Some(json!({
                    "name": conflict.name,
                    "previous_source": conflict.previous_source,
                    "new_source": conflict.new_source,
                })),
            );
        }

        self.database = merged;
        Ok(conflicts)
    }
}
