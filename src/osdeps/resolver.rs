//! The resolver: a rule database plus the context it is evaluated in.

use std::sync::{LazyLock, RwLock};

use super::alias::AliasTable;
use super::database::RuleDatabase;
use super::error::ConfigError;
use super::manager::PackageManagerRegistry;
use super::matcher::{ManagerResolution, Matcher};
use crate::common::distro::OperatingSystem;

static DEFAULT_OPERATING_SYSTEM: LazyLock<RwLock<Option<OperatingSystem>>> =
    LazyLock::new(|| RwLock::new(None));

/// Resolves osdeps names into per-manager package lists for one OS.
#[derive(Debug, Clone)]
pub struct OsPackageResolver {
    pub(crate) database: RuleDatabase,
    pub(crate) aliases: AliasTable,
    pub(crate) managers: PackageManagerRegistry,
    pub(crate) operating_system: Option<OperatingSystem>,
    pub(crate) prefer_indep_over_os_packages: bool,
}

impl OsPackageResolver {
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::default()
    }

    /// Resolver over `database` using the process-wide defaults.
    pub fn new(database: RuleDatabase) -> Result<Self, ConfigError> {
        Self::builder().database(database).build()
    }

    /// Set the OS new resolvers start with when none is given explicitly.
    pub fn set_default_operating_system(os: Option<OperatingSystem>) {
        if let Ok(mut default) = DEFAULT_OPERATING_SYSTEM.write() {
            *default = os;
        }
    }

    pub fn default_operating_system() -> Option<OperatingSystem> {
        DEFAULT_OPERATING_SYSTEM
            .read()
            .map(|os| os.clone())
            .unwrap_or_default()
    }

    pub fn database(&self) -> &RuleDatabase {
        &self.database
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn package_managers(&self) -> &PackageManagerRegistry {
        &self.managers
    }

    /// Identifier of the native package manager.
    pub fn os_package_manager(&self) -> &str {
        self.managers.native()
    }

    pub fn operating_system(&self) -> Option<&OperatingSystem> {
        self.operating_system.as_ref()
    }

    pub fn set_operating_system(&mut self, os: Option<OperatingSystem>) {
        self.operating_system = os;
    }

    pub fn prefer_indep_over_os_packages(&self) -> bool {
        self.prefer_indep_over_os_packages
    }

    pub fn set_prefer_indep_over_os_packages(&mut self, prefer: bool) {
        self.prefer_indep_over_os_packages = prefer;
    }

    /// True when an OS is configured and it has a name besides `default`.
    pub fn supported_operating_system(&self) -> bool {
        self.operating_system
            .as_ref()
            .is_some_and(OperatingSystem::is_supported)
    }

    /// Apply the alias table to `name`.
    pub fn resolve_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.resolve(name)
    }

    /// Whether the database defines `name` (after alias substitution).
    pub fn knows(&self, name: &str) -> bool {
        self.database.contains(self.resolve_name(name))
    }

    pub fn all_package_names(&self) -> impl Iterator<Item = &str> {
        self.database.package_names()
    }

    pub fn source_of(&self, name: &str) -> Option<&str> {
        self.database.source_of(self.resolve_name(name))
    }

    /// Resolve `name` for the configured OS.
    ///
    /// `None` means the database has no definition at all for `name`. An
    /// empty list means it is defined, but not for this OS. Otherwise the
    /// native manager comes first, followed by the other managers that got
    /// a contribution, in registry order.
    pub fn resolve_package(&self, name: &str) -> Option<Vec<ManagerResolution>> {
        let name = self.resolve_name(name);
        self.resolve_in(&self.database, name)
    }

    /// Resolve `name` against another database with this resolver's context.
    pub(crate) fn resolve_in(&self, database: &RuleDatabase, name: &str) -> Option<Vec<ManagerResolution>> {
        let rule = database.rule(name)?;
        Some(self.matcher().resolve(name, rule))
    }

    pub(crate) fn matcher(&self) -> Matcher<'_> {
        Matcher::new(
            &self.managers,
            self.operating_system.as_ref(),
            self.prefer_indep_over_os_packages,
        )
    }
}

/// Builder for [`OsPackageResolver`]. Unset parts fall back to the
/// process-wide defaults.
#[derive(Debug, Default)]
pub struct ResolverBuilder {
    database: RuleDatabase,
    aliases: Option<AliasTable>,
    managers: Option<PackageManagerRegistry>,
    operating_system: Option<Option<OperatingSystem>>,
    prefer_indep_over_os_packages: bool,
}

impl ResolverBuilder {
    pub fn database(mut self, database: RuleDatabase) -> Self {
        self.database = database;
        self
    }

    pub fn aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = Some(aliases);
        self
    }

    pub fn package_managers(mut self, managers: PackageManagerRegistry) -> Self {
        self.managers = Some(managers);
        self
    }

    /// Use `os` instead of the process-wide default. `None` means the OS is
    /// explicitly unknown.
    pub fn operating_system(mut self, os: Option<OperatingSystem>) -> Self {
        self.operating_system = Some(os);
        self
    }

    pub fn prefer_indep_over_os_packages(mut self, prefer: bool) -> Self {
        self.prefer_indep_over_os_packages = prefer;
        self
    }

    /// Validate the database against the manager registry and build.
    ///
    /// Without an explicit registry the native manager is inferred from the
    /// OS names, falling back to the registry default.
    pub fn build(self) -> Result<OsPackageResolver, ConfigError> {
        let operating_system = self
            .operating_system
            .unwrap_or_else(OsPackageResolver::default_operating_system);
        let managers = self.managers.unwrap_or_else(|| {
            operating_system
                .as_ref()
                .and_then(OperatingSystem::native_package_manager)
                .map(|native| PackageManagerRegistry::with_defaults(native.id()))
                .unwrap_or_default()
        });
        self.database.validate(&managers)?;

        Ok(OsPackageResolver {
            database: self.database,
            aliases: self.aliases.unwrap_or_else(AliasTable::global),
            managers,
            operating_system,
            prefer_indep_over_os_packages: self.prefer_indep_over_os_packages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osdeps::alias;
    use crate::osdeps::matcher::ResolveStatus;
    use serial_test::serial;

    fn test_os() -> OperatingSystem {
        OperatingSystem::new(["test", "debian", "default"], ["v1.0", "v1", "default"])
    }

    fn create_osdep(yaml: &str) -> OsPackageResolver {
        let database = RuleDatabase::from_yaml_str(yaml, "test.osdeps").unwrap();
        OsPackageResolver::builder()
            .database(database)
            .operating_system(Some(test_os()))
            .package_managers(PackageManagerRegistry::from_ids("apt-dpkg", ["gem", "pip"]))
            .aliases(AliasTable::new())
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_package_unknown_name_is_none() {
        let resolver = create_osdep("pkg: {test: a}");
        assert_eq!(resolver.resolve_package("other"), None);
    }

    #[test]
    fn test_resolve_package_known_but_unmatched_is_empty() {
        let resolver = create_osdep("pkg: {other_test: pkg1.1}");
        assert_eq!(resolver.resolve_package("pkg"), Some(vec![]));
    }

    #[test]
    fn test_resolve_package_specific_version() {
        let resolver = create_osdep("pkg: {test: {v1.0: pkg1.0 blabla, default: pkgdef}}");
        let result = resolver.resolve_package("pkg").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].manager, "apt-dpkg");
        assert_eq!(result[0].status, ResolveStatus::FoundPackages);
        assert_eq!(result[0].packages, vec!["pkg1.0 blabla"]);
    }

    #[test]
    fn test_resolve_package_applies_aliases() {
        let database = RuleDatabase::from_yaml_str("pkg: {test: {v1.0: pkg1.0}}", "test.osdeps").unwrap();
        let resolver = OsPackageResolver::builder()
            .database(database)
            .operating_system(Some(test_os()))
            .aliases([("bla", "pkg")].into_iter().collect())
            .build()
            .unwrap();
        let result = resolver.resolve_package("bla").unwrap();
        assert_eq!(result[0].packages, vec!["pkg1.0"]);
        assert!(resolver.knows("bla"));
        assert_eq!(resolver.source_of("bla"), Some("test.osdeps"));
    }

    #[test]
    fn test_manager_routing_uses_substituted_name() {
        let database = RuleDatabase::from_yaml_str("pkg: gem", "test.osdeps").unwrap();
        let resolver = OsPackageResolver::builder()
            .database(database)
            .operating_system(Some(test_os()))
            .package_managers(PackageManagerRegistry::from_ids("apt-dpkg", ["gem"]))
            .aliases([("bla", "pkg")].into_iter().collect())
            .build()
            .unwrap();
        let result = resolver.resolve_package("bla").unwrap();
        assert_eq!(result[1].manager, "gem");
        assert_eq!(result[1].packages, vec!["pkg"]);
    }

    #[test]
    fn test_build_rejects_exhausted_axis() {
        let database = RuleDatabase::from_yaml_str("pkg: {test: {v1.0: {x: y}}}", "bad.osdeps").unwrap();
        let err = OsPackageResolver::builder()
            .database(database)
            .operating_system(Some(test_os()))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::AxisExhausted { .. }));
    }

    #[test]
    fn test_supported_operating_system() {
        let mut resolver = create_osdep("pkg: a");
        assert!(resolver.supported_operating_system());
        resolver.set_operating_system(Some(OperatingSystem::new(["default"], ["v1.0"])));
        assert!(!resolver.supported_operating_system());
        resolver.set_operating_system(None);
        assert!(!resolver.supported_operating_system());
    }

    #[test]
    fn test_native_manager_inferred_from_os() {
        let resolver = OsPackageResolver::builder()
            .operating_system(Some(OperatingSystem::new(["manjaro", "arch"], ["rolling"])))
            .build()
            .unwrap();
        assert_eq!(resolver.os_package_manager(), "pacman");
        assert!(resolver.package_managers().contains("gem"));
    }

    #[test]
    #[serial]
    fn test_it_initializes_itself_with_the_global_operating_system() {
        OsPackageResolver::set_default_operating_system(Some(test_os()));
        let resolver = OsPackageResolver::new(RuleDatabase::new()).unwrap();
        assert_eq!(resolver.operating_system(), Some(&test_os()));

        // an explicit OS wins over the global one
        let resolver = OsPackageResolver::builder()
            .operating_system(None)
            .build()
            .unwrap();
        assert_eq!(resolver.operating_system(), None);
        OsPackageResolver::set_default_operating_system(None);
    }

    #[test]
    #[serial]
    fn test_global_aliases_are_captured_at_build_time() {
        alias::clear_global();
        alias::register_global("bla", "pkg");
        let database = RuleDatabase::from_yaml_str("pkg: {default: x}", "test.osdeps").unwrap();
        let resolver = OsPackageResolver::builder()
            .database(database)
            .operating_system(Some(test_os()))
            .build()
            .unwrap();
        alias::clear_global();
        assert_eq!(resolver.resolve_package("bla").unwrap()[0].packages, vec!["x"]);
    }
}
