//! The recursive rule tree stored for each osdeps entry.

use std::collections::BTreeMap;

use serde_yaml::Value;

use super::error::ConfigError;
use super::manager::PackageManagerRegistry;

/// Literal that makes a branch contribute nothing while still counting as a match.
pub const IGNORE: &str = "ignore";
/// Literal that marks the current manager as unable to provide the package.
pub const NONEXISTENT: &str = "nonexistent";
/// Catch-all candidate present at the end of both OS axes.
pub const DEFAULT_KEY: &str = "default";

/// One node of an osdeps definition.
///
/// ```yaml
/// cmake:
///   ubuntu,debian:
///     '22.04': cmake
///     default: [cmake, cmake-data]
///   gem: ignore
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Literal(String),
    List(Vec<Rule>),
    /// Keys are kept sorted, the order in the source file carries no meaning.
    Selector(BTreeMap<String, Rule>),
}

impl Rule {
    /// Parse a rule from an already deserialized YAML node.
    ///
    /// `source_label` and `package` only serve error messages.
    pub fn from_yaml(value: &Value, source_label: &str, package: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidRule {
            source_label: source_label.to_string(),
            package: package.to_string(),
            reason,
        };

        match value {
            Value::Sequence(items) => {
                if items.is_empty() {
                    return Err(invalid("empty list".to_string()));
                }
                let rules = items
                    .iter()
                    .map(|item| Self::from_yaml(item, source_label, package))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::List(rules))
            }
            Value::Mapping(mapping) => {
                if mapping.is_empty() {
                    return Err(invalid("empty mapping".to_string()));
                }
                let mut selector = BTreeMap::new();
                for (key, value) in mapping {
                    let key = scalar_to_string(key)
                        .filter(|k| !k.trim().is_empty())
                        .ok_or_else(|| invalid(format!("unsupported key {:?}", key)))?;
                    let rule = Self::from_yaml(value, source_label, package)?;
                    selector.insert(key, rule);
                }
                Ok(Self::Selector(selector))
            }
            Value::Null => Err(invalid("missing value".to_string())),
            Value::Tagged(tagged) => Err(invalid(format!("unexpected tag {}", tagged.tag))),
            scalar => {
                let literal = scalar_to_string(scalar)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| invalid("empty package name".to_string()))?;
                Ok(Self::Literal(literal))
            }
        }
    }

    /// Check the rule shape against a manager registry.
    ///
    /// At the top level two OS axes are available (name, then version). A
    /// selector consumes one of them for its non-manager keys, manager keys
    /// keep the remaining ones. A selector with OS keys once both are
    /// consumed can never match and is rejected.
    pub fn validate(
        &self,
        managers: &PackageManagerRegistry,
        source_label: &str,
        package: &str,
    ) -> Result<(), ConfigError> {
        self.validate_at(managers, source_label, package, 2)
    }

    fn validate_at(
        &self,
        managers: &PackageManagerRegistry,
        source_label: &str,
        package: &str,
        axes_left: u8,
    ) -> Result<(), ConfigError> {
        match self {
            Self::Literal(_) => Ok(()),
            Self::List(items) => items
                .iter()
                .try_for_each(|item| item.validate_at(managers, source_label, package, axes_left)),
            Self::Selector(entries) => {
                for (key, rule) in entries {
                    if managers.contains(key) {
                        rule.validate_at(managers, source_label, package, axes_left)?;
                    } else if axes_left == 0 {
                        return Err(ConfigError::AxisExhausted {
                            source_label: source_label.to_string(),
                            package: package.to_string(),
                            key: key.clone(),
                        });
                    } else {
                        rule.validate_at(managers, source_label, package, axes_left - 1)?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Candidates encoded by a selector key: `"Ubuntu, debian"` -> `["ubuntu", "debian"]`.
pub fn key_candidates(key: &str) -> impl Iterator<Item = String> + '_ {
    key.split(',')
        .map(|part| part.trim().to_lowercase())
        .filter(|part| !part.is_empty())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
