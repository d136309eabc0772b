use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::osdeps::manager::PackageManager;
use crate::osdeps::rule::DEFAULT_KEY;
use crate::ui::prelude::*;

/// Environment variable overriding OS detection, `names:versions`.
pub const OS_ENV_VAR: &str = "OSDEPS_OS";

const OS_RELEASE_PATH: &str = "/etc/os-release";
const RELEASE_COMMAND: &str = "lsb_release";

static OS_RELEASE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\w+)=(?:"([^"]*)"|'([^']*)'|([^"'\s]*))$"#).expect("valid os-release regex")
});
static VERSION_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w.]+").expect("valid version separator regex"));

/// The two OS axes used to select osdeps definitions.
///
/// Both lists are ordered from the most specific candidate to the least
/// specific one, e.g. `["ubuntu", "debian"]` and `["22.04", "jammy"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingSystem {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub versions: Vec<String>,
}

impl OperatingSystem {
    pub fn new<N, V, S, T>(names: N, versions: V) -> Self
    where
        N: IntoIterator<Item = S>,
        V: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            versions: versions.into_iter().map(Into::into).collect(),
        }
    }

    /// Detect the current operating system.
    ///
    /// `OSDEPS_OS` wins over everything, then `/etc/os-release`, then
    /// `lsb_release`. Returns `None` when nothing is known about the OS.
    pub fn detect() -> Option<Self> {
        if let Some(from_env) = Self::from_env() {
            return from_env.map(|os| os.normalized());
        }

        let detected = Self::from_os_release(Path::new(OS_RELEASE_PATH))
            .or_else(|| Self::from_release_command(RELEASE_COMMAND));
        match &detected {
            Some(os) => emit(
                Level::Debug,
                "osdeps.detect.found",
                &format!("Detected operating system {}", os),
                None,
            ),
            None => emit(
                Level::Debug,
                "osdeps.detect.none",
                "Could not detect the operating system",
                None,
            ),
        }
        detected.map(|os| os.normalized())
    }

    /// Read the `OSDEPS_OS` override.
    ///
    /// `None` if unset, `Some(None)` if set to an empty value, which means
    /// the OS is explicitly unknown.
    pub fn from_env() -> Option<Option<Self>> {
        let value = std::env::var(OS_ENV_VAR).ok()?;
        Some(Self::parse_spec(&value))
    }

    /// Parse `names:versions`, both comma separated. The version part is optional.
    pub fn parse_spec(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }
        let (names, versions) = spec.split_once(':').unwrap_or((spec, ""));
        let split = |list: &str| -> Vec<String> {
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        };
        Some(Self {
            names: split(names),
            versions: split(versions),
        })
    }

    /// Parse an os-release file. `None` if it does not exist or cannot be read.
    pub fn from_os_release(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        Some(Self::parse_os_release(&content))
    }

    /// Extract the axes from os-release content.
    ///
    /// Names come from `ID` and `ID_LIKE`, versions from `VERSION_ID`, the
    /// words of `VERSION` and `VERSION_CODENAME`.
    pub fn parse_os_release(content: &str) -> Self {
        let mut id = None;
        let mut id_like = None;
        let mut version_id = None;
        let mut version = None;
        let mut codename = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some(captures) = OS_RELEASE_LINE.captures(line) else {
                if is_debug_enabled() {
                    emit(
                        Level::Debug,
                        "osdeps.os_release.unparsed",
                        &format!("Could not parse os-release line {:?}", line),
                        None,
                    );
                }
                continue;
            };
            let value = (2..=4)
                .find_map(|group| captures.get(group))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            match &captures[1] {
                "ID" => id = Some(value),
                "ID_LIKE" => id_like = Some(value),
                "VERSION_ID" => version_id = Some(value),
                "VERSION" => version = Some(value),
                "VERSION_CODENAME" => codename = Some(value),
                _ => {}
            }
        }

        let mut names = Vec::new();
        names.extend(id);
        if let Some(like) = id_like {
            names.extend(like.split_whitespace().map(String::from));
        }

        let mut versions = Vec::new();
        versions.extend(version_id);
        if let Some(version) = version {
            versions.extend(
                VERSION_SEPARATOR
                    .split(&version)
                    .filter(|s| !s.is_empty())
                    .map(String::from),
            );
        }
        versions.extend(codename);

        Self {
            names: dedup(names),
            versions: dedup(versions),
        }
    }

    /// Ask a release-info command (`lsb_release`) found on `PATH`.
    ///
    /// `None` if the program is not on `PATH` or fails.
    pub fn from_release_command(program: &str) -> Option<Self> {
        let path = which::which(program).ok()?;
        let output = duct::cmd(path, ["-a"])
            .stderr_null()
            .read()
            .ok()?;
        let os = Self::parse_release_output(&output);
        if os.names.is_empty() { None } else { Some(os) }
    }

    /// Parse `Key: Value` lines as printed by `lsb_release -a`.
    pub fn parse_release_output(output: &str) -> Self {
        let mut names = Vec::new();
        let mut versions = Vec::new();

        for line in output.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() || value.eq_ignore_ascii_case("n/a") {
                continue;
            }
            match key.trim() {
                "Distributor ID" => names.push(value.to_string()),
                "Release" | "Codename" => versions.push(value.to_string()),
                _ => {}
            }
        }

        Self {
            names: dedup(names),
            versions: dedup(versions),
        }
    }

    /// Lowercase both axes and make sure each ends with `default`.
    pub fn normalized(&self) -> Self {
        let normalize = |list: &[String]| {
            let mut list: Vec<String> = dedup(list.iter().map(|s| s.to_lowercase()).collect());
            if !list.iter().any(|s| s == DEFAULT_KEY) {
                list.push(DEFAULT_KEY.to_string());
            }
            list
        };
        Self {
            names: normalize(&self.names),
            versions: normalize(&self.versions),
        }
    }

    /// An OS is supported when it has at least one name besides `default`.
    pub fn is_supported(&self) -> bool {
        self.names.iter().any(|name| name != DEFAULT_KEY)
    }

    /// The native package manager of the most specific known OS name.
    pub fn native_package_manager(&self) -> Option<PackageManager> {
        self.names
            .iter()
            .find_map(|name| PackageManager::native_for_os_name(&name.to_lowercase()))
    }
}

impl std::fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.names.join(","), self.versions.join(","))
    }
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(values.len());
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}
