//! Single-package availability.

use serde::Serialize;

use super::matcher::ManagerResolution;
use super::resolver::OsPackageResolver;

/// Overall state of one osdeps name on this OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Nothing is known about the name.
    NoPackage,
    /// The name is known but no OS was ever configured.
    UnknownOs,
    /// The name is known but not defined for this OS, or the OS is unsupported.
    WrongOs,
    /// Defined for this OS, but nothing needs installing.
    Ignore,
    /// Some manager is explicitly unable to provide it.
    Nonexistent,
    /// At least one package has to be installed.
    Available,
}

impl Availability {
    /// Reduce a resolution to a single state. `Nonexistent` wins over
    /// everything, then `Available` if any list is non-empty.
    pub fn classify(resolution: Option<&[ManagerResolution]>) -> Self {
        let Some(resolution) = resolution else {
            return Self::NoPackage;
        };
        if resolution.is_empty() {
            Self::WrongOs
        } else if resolution.iter().any(ManagerResolution::is_nonexistent) {
            Self::Nonexistent
        } else if resolution.iter().all(|r| r.packages.is_empty()) {
            Self::Ignore
        } else {
            Self::Available
        }
    }

    /// True for the states where the dependency counts as satisfiable.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available | Self::Ignore)
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoPackage => "no package",
            Self::UnknownOs => "unknown OS",
            Self::WrongOs => "wrong OS",
            Self::Ignore => "ignored",
            Self::Nonexistent => "nonexistent",
            Self::Available => "available",
        };
        write!(f, "{}", s)
    }
}

impl OsPackageResolver {
    /// Availability of `name` on the configured OS.
    ///
    /// The matcher is not run when the OS is unknown or unsupported.
    pub fn availability_of(&self, name: &str) -> Availability {
        if !self.knows(name) {
            return Availability::NoPackage;
        }
        if self.operating_system.is_none() {
            return Availability::UnknownOs;
        }
        if !self.supported_operating_system() {
            return Availability::WrongOs;
        }
        Availability::classify(self.resolve_package(name).as_deref())
    }

    /// True if `name` is available or explicitly ignored on this OS.
    pub fn has(&self, name: &str) -> bool {
        self.availability_of(name).is_available()
    }
}
