use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::distro::OperatingSystem;
use super::paths;
use crate::osdeps::{
    AliasTable, OsPackageResolver, PackageManager, PackageManagerRegistry, RuleDatabase,
};
use crate::ui::prelude::*;

fn default_sources() -> Vec<String> {
    vec![
        paths::default_sources_dir()
            .join("*.osdeps")
            .display()
            .to_string(),
    ]
}

fn default_package_managers() -> Vec<String> {
    PackageManager::DEFAULT_REGISTERED
        .iter()
        .map(|m| m.id().to_string())
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// osdeps files or glob patterns, merged in order
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    /// Native package manager, inferred from the OS when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_manager: Option<String>,
    #[serde(default = "default_package_managers")]
    pub package_managers: Vec<String>,
    #[serde(default)]
    pub prefer_indep_over_os_packages: bool,
    /// Skip detection and use these OS names and versions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<OperatingSystem>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sources: default_sources(),
            native_manager: None,
            package_managers: default_package_managers(),
            prefer_indep_over_os_packages: false,
            operating_system: None,
            aliases: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load the config from the default location. If the config file does
    /// not exist, create a default config file and return the default.
    pub fn load() -> Result<Config> {
        Self::load_from(&paths::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Config> {
        if !path.exists() {
            let default = Config::default();
            default.save_to(path)?;
            emit(
                Level::Debug,
                "osdeps.config.created",
                &format!("Wrote default config to {}", path.display()),
                None,
            );
            return Ok(default);
        }
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let c: Config = toml::from_str(&s)
            .with_context(|| format!("parsing config toml {}", path.display()))?;
        Ok(c)
    }

    /// Save the config to `path` (overwrites file)
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("creating config directory")?;
        }
        let toml = toml::to_string_pretty(self).context("serializing config to toml")?;
        fs::write(path, toml)
            .with_context(|| format!("writing config to {}", path.display()))?;
        Ok(())
    }

    /// Expand `~` and glob patterns in `sources`.
    ///
    /// Patterns matching nothing are reported and skipped.
    pub fn source_paths(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for source in &self.sources {
            let expanded = shellexpand::tilde(source);
            let pattern = glob::glob(&expanded)
                .with_context(|| format!("invalid source pattern {}", source))?;
            let mut matched = false;
            for entry in pattern {
                let path = entry.with_context(|| format!("reading matches of {}", source))?;
                if path.is_file() {
                    files.push(path);
                    matched = true;
                }
            }
            if !matched {
                emit(
                    Level::Debug,
                    "osdeps.config.no_match",
                    &format!("No osdeps file matches {}", source),
                    Some(json!({ "source": source })),
                );
            }
        }
        Ok(files)
    }

    /// The configured OS, or the detected one when the config has none.
    pub fn operating_system(&self) -> Option<OperatingSystem> {
        match &self.operating_system {
            Some(os) => Some(os.normalized()),
            None => OperatingSystem::detect(),
        }
    }

    pub fn registry(&self, operating_system: Option<&OperatingSystem>) -> PackageManagerRegistry {
        let native = self
            .native_manager
            .clone()
            .or_else(|| {
                operating_system
                    .and_then(OperatingSystem::native_package_manager)
                    .map(|m| m.id().to_string())
            })
            .unwrap_or_else(|| PackageManager::Apt.id().to_string());
        PackageManagerRegistry::from_ids(&native, &self.package_managers)
    }

    /// Build a resolver from the configured sources.
    pub fn resolver(&self) -> Result<OsPackageResolver> {
        self.resolver_with(&[])
    }

    /// Like [`Config::resolver`], merging `extra_files` after the
    /// configured sources.
    pub fn resolver_with(&self, extra_files: &[PathBuf]) -> Result<OsPackageResolver> {
        let operating_system = self.operating_system();
        let managers = self.registry(operating_system.as_ref());
        let aliases: AliasTable = self
            .aliases
            .iter()
            .map(|(alias, canonical)| (alias.as_str(), canonical.as_str()))
            .collect();

        let mut resolver = OsPackageResolver::builder()
            .operating_system(operating_system)
            .package_managers(managers)
            .aliases(aliases)
            .prefer_indep_over_os_packages(self.prefer_indep_over_os_packages)
            .build()
            .context("building resolver")?;

        let files = self.source_paths()?;
        for file in files.iter().chain(extra_files) {
            let database = RuleDatabase::load_file(file)?;
            resolver
                .merge(&database)
                .with_context(|| format!("loading osdeps from {}", file.display()))?;
            emit(
                Level::Debug,
                "osdeps.config.source_loaded",
                &format!("Loaded {} definitions from {}", database.len(), file.display()),
                None,
            );
        }
        Ok(resolver)
    }
}
