use osdeps::common::distro::OperatingSystem;
use osdeps::osdeps::{
    AliasTable, Availability, ManagerResolution, MissingOsDep, OsPackageResolver,
    PackageManagerRegistry, ResolveStatus, RuleDatabase,
};

fn test_os() -> OperatingSystem {
    OperatingSystem::new(["test", "debian", "default"], ["v1.0", "v1", "default"])
}

fn resolver_for(yaml: &str, os: OperatingSystem) -> OsPackageResolver {
    OsPackageResolver::builder()
        .database(RuleDatabase::from_yaml_str(yaml, "scenario.osdeps").unwrap())
        .operating_system(Some(os))
        .package_managers(PackageManagerRegistry::from_ids("apt-dpkg", ["gem", "pip"]))
        .aliases(AliasTable::new())
        .build()
        .unwrap()
}

fn native(status: ResolveStatus, packages: &[&str]) -> ManagerResolution {
    ManagerResolution {
        manager: "apt-dpkg".to_string(),
        status,
        packages: packages.iter().map(|p| p.to_string()).collect(),
    }
}

#[test]
fn test_specific_version_wins_over_default() {
    let resolver = resolver_for(
        "pkg:\n  test:\n    v1.0: pkg1.0 blabla\n    default: pkgdef\n",
        test_os(),
    );
    assert_eq!(
        resolver.resolve_package("pkg"),
        Some(vec![native(ResolveStatus::FoundPackages, &["pkg1.0 blabla"])])
    );
}

#[test]
fn test_specific_name_wins_over_default() {
    let resolver = resolver_for("pkg: {default: pkgdef, debian: pkgdeb, test: pkgtest}", test_os());
    assert_eq!(
        resolver.resolve_package("pkg"),
        Some(vec![native(ResolveStatus::FoundPackages, &["pkgtest"])])
    );
}

#[test]
fn test_irrelevant_name_never_matches() {
    let resolver = resolver_for("pkg: {other_test: pkg1.1, default: pkgdef}", test_os());
    assert_eq!(
        resolver.resolve_package("pkg"),
        Some(vec![native(ResolveStatus::FoundPackages, &["pkgdef"])])
    );

    let resolver = resolver_for("pkg: {other_test: pkg1.1}", test_os());
    assert_eq!(resolver.resolve_package("pkg"), Some(vec![]));
    assert_eq!(resolver.resolve_package("unknown"), None);
}

#[test]
fn test_nonexistent_overrides_packages_of_the_same_manager() {
    let resolver = resolver_for(
        "pkg:\n  - global_pkg1\n  - global_pkg2\n  - test: nonexistent\n    other_test: pkg1.1\n",
        test_os(),
    );
    assert_eq!(
        resolver.resolve_package("pkg"),
        Some(vec![native(
            ResolveStatus::Nonexistent,
            &["global_pkg1", "global_pkg2"]
        )])
    );
    assert_eq!(resolver.availability_of("pkg"), Availability::Nonexistent);
}

#[test]
fn test_bulk_resolution_aborts_on_nonexistent() {
    let resolver = resolver_for(
        "pkg0: {test: pkg0}\npkg1: {test: pkg1, gem: gempkg1}\npkg2: {test: pkg2, gem: nonexistent}\n",
        test_os(),
    );
    assert_eq!(
        resolver.resolve_os_packages(&["pkg0", "pkg1"]).unwrap(),
        vec![
            ("apt-dpkg".to_string(), vec!["pkg0".to_string(), "pkg1".to_string()]),
            ("gem".to_string(), vec!["gempkg1".to_string()]),
        ]
    );
    assert_eq!(
        resolver.resolve_os_packages(&["pkg0", "pkg1", "pkg2"]),
        Err(MissingOsDep::Nonexistent {
            name: "pkg2".to_string(),
            manager: "gem".to_string()
        })
    );
}

#[test]
fn test_merge_with_itself_is_silent_for_any_os() {
    let yaml = r#"
cmake:
  debian,ubuntu:
    "20.04": cmake3
    default: cmake
  arch: cmake
  gem: cmake-gem
ruby:
  - ruby
  - test: nonexistent
  - default: ignore
python: pip
"#;
    let systems = [
        test_os(),
        OperatingSystem::new(["ubuntu", "debian"], ["20.04"]),
        OperatingSystem::new(["arch"], Vec::<String>::new()),
        OperatingSystem::new(["unknown"], ["1"]),
    ];
    for os in systems {
        let mut resolver = resolver_for(yaml, os);
        let same = resolver.database().clone();
        assert!(resolver.merge(&same).unwrap().is_empty());
    }
}

#[test]
fn test_merge_warns_only_for_the_active_os() {
    let mut resolver = resolver_for("pkg: {test: a, other: b}", test_os());
    let unrelated = RuleDatabase::from_yaml_str("pkg: {test: a, other: c}", "second.osdeps").unwrap();
    assert!(resolver.merge(&unrelated).unwrap().is_empty());

    let relevant = RuleDatabase::from_yaml_str("pkg: {test: d}", "third.osdeps").unwrap();
    let conflicts = resolver.merge(&relevant).unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].previous_source, "second.osdeps");
    assert_eq!(conflicts[0].new_source, "third.osdeps");
}
