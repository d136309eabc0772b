//! Rule databases: `package name -> Rule`, with the source each entry came from.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_yaml::Value;

use super::error::ConfigError;
use super::manager::PackageManagerRegistry;
use super::rule::Rule;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub rule: Rule,
    /// Where the current definition comes from.
    pub source: String,
    /// Sources of definitions replaced by later merges, oldest first.
    pub history: Vec<String>,
}

/// A parsed set of osdeps definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleDatabase {
    entries: BTreeMap<String, Entry>,
}

impl RuleDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML document whose top level maps package names to rules.
    ///
    /// An empty document yields an empty database.
    pub fn from_yaml_str(content: &str, source_label: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_yaml::from_str(content).map_err(|error| ConfigError::Yaml {
            source_label: source_label.to_string(),
            error,
        })?;
        Self::from_yaml(&value, source_label)
    }

    pub fn from_yaml(value: &Value, source_label: &str) -> Result<Self, ConfigError> {
        let mapping = match value {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(ConfigError::NotAMapping {
                    source_label: source_label.to_string(),
                });
            }
        };

        let mut database = Self::default();
        for (name, rule) in mapping {
            let Some(name) = name.as_str() else {
                return Err(ConfigError::InvalidRule {
                    source_label: source_label.to_string(),
                    package: format!("{:?}", name),
                    reason: "package names must be strings".to_string(),
                });
            };
            let rule = Rule::from_yaml(rule, source_label, name)?;
            database.insert(name, rule, source_label);
        }
        Ok(database)
    }

    /// Read and parse an osdeps file. The file path is used as provenance.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        Self::from_yaml_str(&content, &path.display().to_string())
    }

    /// Add or replace a definition, recording the replaced source in the history.
    /// Redefining a name from the same source leaves the history alone.
    pub fn insert(&mut self, name: &str, rule: Rule, source: &str) {
        match self.entries.get_mut(name) {
            Some(entry) => {
                if entry.source != source {
                    let previous = std::mem::replace(&mut entry.source, source.to_string());
                    entry.history.push(previous);
                }
                entry.rule = rule;
            }
            None => {
                self.entries.insert(
                    name.to_string(),
                    Entry {
                        rule,
                        source: source.to_string(),
                        history: Vec::new(),
                    },
                );
            }
        }
    }

    /// Take over an entry of another database. Its own history follows the
    /// source it replaces.
    pub(crate) fn insert_entry(&mut self, name: &str, entry: &Entry) {
        let same_source = self.source_of(name) == Some(entry.source.as_str());
        self.insert(name, entry.rule.clone(), &entry.source);
        if same_source {
            return;
        }
        if let Some(current) = self.entries.get_mut(name) {
            current.history.extend(entry.history.iter().cloned());
        }
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.entries.get(name).map(|entry| &entry.rule)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Source of the active definition of `name`.
    pub fn source_of(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|entry| entry.source.as_str())
    }

    /// Every source that defined `name`, oldest first, the active one last.
    pub fn sources_of(&self, name: &str) -> Vec<&str> {
        self.entries
            .get(name)
            .map(|entry| {
                entry
                    .history
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::once(entry.source.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate every entry against `managers`, see [`Rule::validate`].
    pub fn validate(&self, managers: &PackageManagerRegistry) -> Result<(), ConfigError> {
        self.entries
            .iter()
            .try_for_each(|(name, entry)| entry.rule.validate(managers, &entry.source, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BASE: &str = r#"
cmake:
  ubuntu,debian: cmake
  arch: cmake
ruby-dev:
  - ruby
  - gem: bundler
"#;

    #[test]
    fn test_from_yaml_str() {
        let db = RuleDatabase::from_yaml_str(BASE, "base.osdeps").unwrap();
        assert_eq!(db.len(), 2);
        assert!(db.contains("cmake"));
        assert_eq!(db.source_of("ruby-dev"), Some("base.osdeps"));
        let names: Vec<_> = db.package_names().collect();
        assert_eq!(names, vec!["cmake", "ruby-dev"]);
    }

    #[test]
    fn test_empty_document_is_empty_database() {
        let db = RuleDatabase::from_yaml_str("", "empty.osdeps").unwrap();
        assert!(db.is_empty());
    }

    #[test]
    fn test_top_level_must_be_mapping() {
        let err = RuleDatabase::from_yaml_str("- a\n- b\n", "list.osdeps").unwrap_err();
        assert!(matches!(err, ConfigError::NotAMapping { .. }));
    }

    #[test]
    fn test_yaml_syntax_error() {
        let err = RuleDatabase::from_yaml_str("cmake: [a, b", "broken.osdeps").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains("broken.osdeps"));
    }

    #[test]
    fn test_insert_records_history() {
        let mut db = RuleDatabase::from_yaml_str(BASE, "base.osdeps").unwrap();
        db.insert("cmake", Rule::Literal("cmake3".to_string()), "overlay.osdeps");
        assert_eq!(db.source_of("cmake"), Some("overlay.osdeps"));
        assert_eq!(db.sources_of("cmake"), vec!["base.osdeps", "overlay.osdeps"]);
        assert_eq!(db.rule("cmake"), Some(&Rule::Literal("cmake3".to_string())));
        assert!(db.sources_of("missing").is_empty());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BASE.as_bytes()).unwrap();
        let db = RuleDatabase::load_file(file.path()).unwrap();
        assert_eq!(db.source_of("cmake"), Some(file.path().display().to_string().as_str()));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RuleDatabase::load_file(Path::new("/does/not/exist.osdeps")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_validate_reports_entry_source() {
        let db = RuleDatabase::from_yaml_str("pkg: {a: {b: {c: x}}}", "deep.osdeps").unwrap();
        let registry = PackageManagerRegistry::new("apt-dpkg");
        let err = db.validate(&registry).unwrap_err();
        assert!(err.to_string().starts_with("deep.osdeps:"));
    }
}
