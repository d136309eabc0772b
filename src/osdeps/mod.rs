//! OS package dependency resolution.
//!
//! Maps abstract dependency names ("osdeps") to concrete package lists per
//! package manager, for the operating system the process runs on.
//!
//! # Architecture
//!
//! - [`Rule`]: a recursive definition read from YAML (literal, list or selector)
//! - [`RuleDatabase`]: name to rule, with the file each definition came from
//! - [`PackageManagerRegistry`]: the native manager plus the other known managers
//! - [`OsPackageResolver`]: evaluates rules against the OS name and version axes
//!
//! # Resolution order
//!
//! Selector keys are matched from the most specific OS candidate to the
//! least specific one, names first, then versions:
//! 1. OS names, e.g. `ubuntu` then `debian` then `default`
//! 2. OS versions, e.g. `22.04` then `jammy` then `default`
//!
//! Keys naming a package manager route their value to that manager whatever
//! the OS.
//!
//! # Example
//!
//! ```ignore
//! use osdeps::common::distro::OperatingSystem;
//! use osdeps::osdeps::{OsPackageResolver, RuleDatabase};
//!
//! let database = RuleDatabase::from_yaml_str("cmake: {debian: cmake, arch: cmake}", "inline")?;
//! let resolver = OsPackageResolver::builder()
//!     .database(database)
//!     .operating_system(Some(OperatingSystem::new(["ubuntu", "debian"], ["22.04"])))
//!     .build()?;
//! let batches = resolver.resolve_os_packages(&["cmake"])?;
//! ```

pub mod alias;
mod availability;
mod batch;
pub mod database;
pub mod error;
pub mod manager;
mod matcher;
mod merge;
mod resolver;
pub mod rule;

pub use alias::AliasTable;
pub use availability::Availability;
pub use database::{Entry, RuleDatabase};
pub use error::{ConfigError, MissingOsDep};
pub use manager::{PackageManager, PackageManagerRegistry};
pub use matcher::{ManagerResolution, ResolveStatus};
pub use merge::MergeConflict;
pub use resolver::{OsPackageResolver, ResolverBuilder};
pub use rule::Rule;
