use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or extending the rule database.
///
/// These are configuration problems: they surface when a database is
/// parsed or attached to a resolver, never in the middle of a resolution.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{source_label}: invalid osdeps entry for '{package}': {reason}")]
    InvalidRule {
        source_label: String,
        package: String,
        reason: String,
    },

    #[error(
        "{source_label}: osdeps entry for '{package}' uses '{key}' as an OS key, but both the OS name and version were already selected"
    )]
    AxisExhausted {
        source_label: String,
        package: String,
        key: String,
    },

    #[error("{source_label}: expected a mapping of package names at the top level")]
    NotAMapping { source_label: String },

    #[error("failed to parse YAML in {source_label}: {error}")]
    Yaml {
        source_label: String,
        #[source]
        error: serde_yaml::Error,
    },

    #[error("failed to read {path}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

/// A requested OS dependency cannot be satisfied.
///
/// This is the only fatal error of the resolver. It aborts a whole batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MissingOsDep {
    #[error("there is no osdeps definition for {name}")]
    UnknownPackage { name: String },

    #[error("there is an osdeps definition for {name}, but the local operating system cannot be detected")]
    UnknownOs { name: String },

    #[error("there is an osdeps definition for {name}, but the local operating system ({os}) is not supported")]
    UnsupportedOs { name: String, os: String },

    #[error("there is an osdeps definition for {name}, but not for this operating system and version ({os})")]
    WrongOs { name: String, os: String },

    #[error("there is no {manager} package for {name}")]
    Nonexistent { name: String, manager: String },
}

impl MissingOsDep {
    /// The (alias-substituted) package name that failed.
    pub fn package_name(&self) -> &str {
        match self {
            Self::UnknownPackage { name }
            | Self::UnknownOs { name }
            | Self::UnsupportedOs { name, .. }
            | Self::WrongOs { name, .. }
            | Self::Nonexistent { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_osdep_messages() {
        let err = MissingOsDep::Nonexistent {
            name: "boost".to_string(),
            manager: "gem".to_string(),
        };
        assert_eq!(err.to_string(), "there is no gem package for boost");
        assert_eq!(err.package_name(), "boost");

        let err = MissingOsDep::UnknownPackage {
            name: "nope".to_string(),
        };
        assert!(err.to_string().contains("no osdeps definition for nope"));
    }

    #[test]
    fn test_config_error_names_source() {
        let err = ConfigError::AxisExhausted {
            source_label: "base.osdeps".to_string(),
            package: "cmake".to_string(),
            key: "jammy".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("base.osdeps:"));
        assert!(msg.contains("'cmake'"));
        assert!(msg.contains("'jammy'"));
    }
}
