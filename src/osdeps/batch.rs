//! Bulk resolution of a list of osdeps names.
//!
//! The result groups packages by manager so that a driver can install each
//! group with a single invocation.

use super::error::MissingOsDep;
use super::matcher::ManagerResolution;
use super::resolver::OsPackageResolver;

impl OsPackageResolver {
    /// Resolve every name in `names` and merge the results per manager.
    ///
    /// The native manager comes first, then the others in registry order.
    /// Package lists keep the request order and are not deduplicated.
    /// Managers with nothing to install are left out.
    ///
    /// The first name that cannot be satisfied aborts the whole batch.
    pub fn resolve_os_packages<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<(String, Vec<String>)>, MissingOsDep> {
        let mut batches: Vec<(String, Vec<String>)> = Vec::new();

        for name in names {
            let name = self.resolve_name(name.as_ref());
            let resolution = self.checked_resolution(name)?;

            for entry in resolution {
                match batches.iter_mut().find(|(manager, _)| *manager == entry.manager) {
                    Some((_, packages)) => packages.extend(entry.packages),
                    None => batches.push((entry.manager, entry.packages)),
                }
            }
        }

        batches.retain(|(_, packages)| !packages.is_empty());
        batches.sort_by_key(|(manager, _)| self.managers.position(manager).unwrap_or(usize::MAX));
        Ok(batches)
    }

    /// The OS is checked before the rule is evaluated, so an unknown or
    /// unsupported OS is reported for every known name.
    fn checked_resolution(&self, name: &str) -> Result<Vec<ManagerResolution>, MissingOsDep> {
        if !self.database.contains(name) {
            return Err(MissingOsDep::UnknownPackage {
                name: name.to_string(),
            });
        }
        let Some(os) = self.operating_system.as_ref() else {
            return Err(MissingOsDep::UnknownOs {
                name: name.to_string(),
            });
        };
        if !os.is_supported() {
            return Err(MissingOsDep::UnsupportedOs {
                name: name.to_string(),
                os: os.to_string(),
            });
        }
        let resolution = self
            .resolve_in(&self.database, name)
            .unwrap_or_default();
        if resolution.is_empty() {
            return Err(MissingOsDep::WrongOs {
                name: name.to_string(),
                os: os.to_string(),
            });
        }
        if let Some(entry) = resolution.iter().find(|e| e.is_nonexistent()) {
            return Err(MissingOsDep::Nonexistent {
                name: name.to_string(),
                manager: entry.manager.clone(),
            });
        }
        Ok(resolution)
    }
}
