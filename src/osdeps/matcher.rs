//! Rule-tree evaluation against the OS axes.
//!
//! A resolution walks the rule of one package with a *target* manager
//! (initially the native one) and the set of OS axes not yet used on the
//! current path. Selectors route manager keys to their manager and pick the
//! most specific OS key on the next free axis: names first, then versions.

use serde::Serialize;

use super::manager::PackageManagerRegistry;
use super::rule::{DEFAULT_KEY, IGNORE, NONEXISTENT, Rule, key_candidates};
use crate::common::distro::OperatingSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStatus {
    FoundPackages,
    Nonexistent,
}

/// What one manager has to do for a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagerResolution {
    pub manager: String,
    pub status: ResolveStatus,
    pub packages: Vec<String>,
}

impl ManagerResolution {
    fn new(manager: &str) -> Self {
        Self {
            manager: manager.to_string(),
            status: ResolveStatus::FoundPackages,
            packages: Vec::new(),
        }
    }

    pub fn is_nonexistent(&self) -> bool {
        self.status == ResolveStatus::Nonexistent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Name,
    Version,
    Exhausted,
}

impl Axis {
    fn next(self) -> Self {
        match self {
            Self::Name => Self::Version,
            Self::Version | Self::Exhausted => Self::Exhausted,
        }
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    entries: Vec<ManagerResolution>,
}

impl Accumulator {
    fn entry(&mut self, manager: &str) -> &mut ManagerResolution {
        let index = match self.entries.iter().position(|e| e.manager == manager) {
            Some(index) => index,
            None => {
                self.entries.push(ManagerResolution::new(manager));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }

    fn touch(&mut self, manager: &str) {
        self.entry(manager);
    }

    fn mark_nonexistent(&mut self, manager: &str) {
        self.entry(manager).status = ResolveStatus::Nonexistent;
    }

    fn push(&mut self, manager: &str, package: &str) {
        self.entry(manager).packages.push(package.to_string());
    }
}

/// Evaluation context shared by every resolution of one resolver.
#[derive(Debug, Clone)]
pub(crate) struct Matcher<'a> {
    managers: &'a PackageManagerRegistry,
    names: Vec<String>,
    versions: Vec<String>,
}

impl<'a> Matcher<'a> {
    /// Without an operating system only `default` OS keys can match.
    pub(crate) fn new(
        managers: &'a PackageManagerRegistry,
        operating_system: Option<&OperatingSystem>,
        prefer_indep_over_os_packages: bool,
    ) -> Self {
        let os = operating_system
            .map(OperatingSystem::normalized)
            .unwrap_or_else(|| OperatingSystem::default().normalized());
        let mut names = os.names;
        if prefer_indep_over_os_packages
            && let Some(index) = names.iter().position(|n| n == DEFAULT_KEY)
        {
            let default = names.remove(index);
            names.insert(0, default);
        }

        Self {
            managers,
            names,
            versions: os.versions,
        }
    }

    /// Evaluate `rule`, the definition of `package`.
    ///
    /// Returns an empty list when nothing along the tree matched this OS.
    /// Otherwise the native manager comes first, then the other managers
    /// that received something, in registry order.
    pub(crate) fn resolve(&self, package: &str, rule: &Rule) -> Vec<ManagerResolution> {
        let mut acc = Accumulator::default();
        self.eval(package, rule, self.managers.native(), false, Axis::Name, &mut acc);

        if acc.entries.is_empty() {
            return Vec::new();
        }
        acc.touch(self.managers.native());

        let mut entries = acc.entries;
        entries.sort_by_key(|e| self.managers.position(&e.manager).unwrap_or(usize::MAX));
        entries
    }

    /// `routed` is set below a manager key: manager names there are plain
    /// package names instead of a redirection.
    fn eval(
        &self,
        package: &str,
        rule: &Rule,
        target: &str,
        routed: bool,
        axis: Axis,
        acc: &mut Accumulator,
    ) {
        match rule {
            Rule::Literal(value) => match value.as_str() {
                IGNORE => acc.touch(target),
                NONEXISTENT => acc.mark_nonexistent(target),
                manager if !routed && self.managers.contains(manager) => acc.push(manager, package),
                name => acc.push(target, name),
            },
            Rule::List(items) => {
                for item in items {
                    self.eval(package, item, target, routed, axis, acc);
                }
            }
            Rule::Selector(entries) => {
                let mut os_keys = Vec::new();
                for (key, subtree) in entries {
                    if self.managers.contains(key) {
                        self.eval(package, subtree, key, true, axis, acc);
                    } else {
                        os_keys.push((key.as_str(), subtree));
                    }
                }

                let candidates = match axis {
                    Axis::Name => &self.names,
                    Axis::Version => &self.versions,
                    Axis::Exhausted => return,
                };
                // The most specific candidate wins even when its subtree
                // contributes nothing.
                let selected = candidates.iter().find_map(|candidate| {
                    os_keys
                        .iter()
                        .find(|(key, _)| key_candidates(key).any(|k| k == *candidate))
                });
                if let Some((_, subtree)) = selected {
                    self.eval(package, subtree, target, routed, axis.next(), acc);
                }
            }
        }
    }
}
