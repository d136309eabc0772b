//! Package manager catalogue and the per-resolver registry.

/// The package managers osdeps knows how to talk about.
///
/// Rule databases refer to managers by their identifier (see [`PackageManager::id`]).
/// A registry may also contain identifiers that are not in this catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    // =========================================================================
    // Native distro package managers
    // =========================================================================
    /// Pacman - Arch Linux family
    Pacman,
    /// APT - Debian/Ubuntu family
    Apt,
    /// DNF - Fedora/RHEL family
    Dnf,
    /// Zypper - OpenSUSE
    Zypper,
    /// Portage - Gentoo
    Emerge,
    /// pkg - FreeBSD
    Pkg,
    /// Homebrew - macOS
    Brew,

    // =========================================================================
    // OS-independent package managers
    // =========================================================================
    /// Flatpak - prebuilt, sandboxed
    Flatpak,
    /// AUR (Arch User Repository) - compiles from source
    Aur,
    /// Cargo - Rust crates
    Cargo,
    /// Snap - Canonical's package format
    Snap,
    /// RubyGems
    Gem,
    /// Python packages
    Pip,
}

impl PackageManager {
    pub const ALL: &'static [PackageManager] = &[
        Self::Pacman,
        Self::Apt,
        Self::Dnf,
        Self::Zypper,
        Self::Emerge,
        Self::Pkg,
        Self::Brew,
        Self::Flatpak,
        Self::Aur,
        Self::Cargo,
        Self::Snap,
        Self::Gem,
        Self::Pip,
    ];

    /// Identifier used in rule databases.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Pacman => "pacman",
            Self::Apt => "apt-dpkg",
            Self::Dnf => "dnf",
            Self::Zypper => "zypper",
            Self::Emerge => "emerge",
            Self::Pkg => "pkg",
            Self::Brew => "brew",
            Self::Flatpak => "flatpak",
            Self::Aur => "aur",
            Self::Cargo => "cargo",
            Self::Snap => "snap",
            Self::Gem => "gem",
            Self::Pip => "pip",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.id() == id)
    }

    /// Managers registered when none are configured. Their ids are never
    /// native package names; `cargo`, `flatpak`, `snap` and `aur` are, so
    /// they have to be registered explicitly.
    pub const DEFAULT_REGISTERED: &'static [PackageManager] = &[Self::Gem, Self::Pip];

    /// Returns true if this is a system/native package manager.
    pub fn is_native(&self) -> bool {
        matches!(
            self,
            Self::Pacman
                | Self::Apt
                | Self::Dnf
                | Self::Zypper
                | Self::Emerge
                | Self::Pkg
                | Self::Brew
        )
    }

    /// Native package manager for an OS name as found in os-release `ID`/`ID_LIKE`.
    pub fn native_for_os_name(name: &str) -> Option<Self> {
        match name {
            "arch" | "archlinux" | "manjaro" | "endeavouros" | "instantos" => Some(Self::Pacman),
            "debian" | "ubuntu" | "pop" | "linuxmint" | "raspbian" => Some(Self::Apt),
            "fedora" | "centos" | "rhel" | "rocky" | "almalinux" => Some(Self::Dnf),
            "opensuse" | "opensuse-leap" | "opensuse-tumbleweed" | "suse" => Some(Self::Zypper),
            "gentoo" => Some(Self::Emerge),
            "freebsd" => Some(Self::Pkg),
            "darwin" | "macos" => Some(Self::Brew),
            _ => None,
        }
    }

    /// Get the install command prefix for this package manager.
    pub fn install_command(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Pacman => ("sudo", &["pacman", "-S", "--noconfirm"]),
            Self::Apt => ("sudo", &["apt-get", "install", "-y"]),
            Self::Dnf => ("sudo", &["dnf", "install", "-y"]),
            Self::Zypper => ("sudo", &["zypper", "install", "-y"]),
            Self::Emerge => ("sudo", &["emerge", "--noreplace"]),
            Self::Pkg => ("sudo", &["pkg", "install", "-y"]),
            Self::Brew => ("brew", &["install"]),
            Self::Flatpak => ("flatpak", &["install", "-y", "flathub"]),
            Self::Aur => ("yay", &["-S", "--noconfirm"]),
            Self::Cargo => ("cargo", &["install"]),
            Self::Snap => ("sudo", &["snap", "install"]),
            Self::Gem => ("gem", &["install"]),
            Self::Pip => ("pip", &["install", "--user"]),
        }
    }

    /// The command line a driver would run to install `packages`.
    pub fn install_hint(&self, packages: &[String]) -> String {
        let (program, args) = self.install_command();
        let mut parts = vec![program.to_string()];
        parts.extend(args.iter().map(|a| a.to_string()));
        parts.extend(packages.iter().cloned());
        parts.join(" ")
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pacman => "Pacman",
            Self::Apt => "APT",
            Self::Dnf => "DNF",
            Self::Zypper => "Zypper",
            Self::Emerge => "Portage",
            Self::Pkg => "pkg",
            Self::Brew => "Homebrew",
            Self::Flatpak => "Flatpak",
            Self::Aur => "AUR",
            Self::Cargo => "Cargo",
            Self::Snap => "Snap",
            Self::Gem => "RubyGems",
            Self::Pip => "pip",
        }
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// The managers a resolver recognizes, with the native one first.
///
/// Registry membership decides whether a selector key is a manager key and
/// whether a bare literal routes to a manager, so it is fixed once a
/// resolver is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManagerRegistry {
    native: String,
    managers: Vec<String>,
}

impl PackageManagerRegistry {
    /// Registry containing only the native manager.
    pub fn new(native: impl Into<String>) -> Self {
        let native = native.into();
        Self {
            managers: vec![native.clone()],
            native,
        }
    }

    /// Registry with `native` plus [`PackageManager::DEFAULT_REGISTERED`].
    pub fn with_defaults(native: impl Into<String>) -> Self {
        let mut registry = Self::new(native);
        for manager in PackageManager::DEFAULT_REGISTERED {
            registry.register(manager.id());
        }
        registry
    }

    /// Build a registry from an explicit list. `native` is always a member,
    /// whether or not `managers` lists it.
    pub fn from_ids<I, S>(native: &str, managers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new(native);
        for id in managers {
            registry.register(id);
        }
        registry
    }

    pub fn register(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.managers.contains(&id) {
            self.managers.push(id);
        }
    }

    pub fn native(&self) -> &str {
        &self.native
    }

    pub fn contains(&self, id: &str) -> bool {
        self.managers.iter().any(|m| m == id)
    }

    /// Position in the output order: native first, then registration order.
    pub fn position(&self, id: &str) -> Option<usize> {
        if id == self.native {
            return Some(0);
        }
        self.managers
            .iter()
            .filter(|m| **m != self.native)
            .position(|m| m == id)
            .map(|p| p + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.native.as_str()).chain(
            self.managers
                .iter()
                .filter(move |m| **m != self.native)
                .map(String::as_str),
        )
    }
}

impl Default for PackageManagerRegistry {
    fn default() -> Self {
        Self::with_defaults(PackageManager::Apt.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_native() {
        assert!(PackageManager::Pacman.is_native());
        assert!(PackageManager::Apt.is_native());
        assert!(PackageManager::Emerge.is_native());

        assert!(!PackageManager::Flatpak.is_native());
        assert!(!PackageManager::Gem.is_native());
        assert!(!PackageManager::Pip.is_native());
    }

    #[test]
    fn test_id_round_trip() {
        for manager in PackageManager::ALL {
            assert_eq!(PackageManager::from_id(manager.id()), Some(*manager));
        }
        assert_eq!(PackageManager::from_id("npm"), None);
    }

    #[test]
    fn test_native_for_os_name() {
        assert_eq!(
            PackageManager::native_for_os_name("ubuntu"),
            Some(PackageManager::Apt)
        );
        assert_eq!(
            PackageManager::native_for_os_name("manjaro"),
            Some(PackageManager::Pacman)
        );
        assert_eq!(PackageManager::native_for_os_name("default"), None);
    }

    #[test]
    fn test_install_hint() {
        let hint = PackageManager::Pacman.install_hint(&["cmake".to_string(), "git".to_string()]);
        assert_eq!(hint, "sudo pacman -S --noconfirm cmake git");
        let hint = PackageManager::Gem.install_hint(&["rake".to_string()]);
        assert_eq!(hint, "gem install rake");
    }

    #[test]
    fn test_registry_order_native_first() {
        let registry = PackageManagerRegistry::from_ids("apt-dpkg", ["gem", "apt-dpkg", "pip"]);
        let ids: Vec<_> = registry.iter().collect();
        assert_eq!(ids, vec!["apt-dpkg", "gem", "pip"]);
        assert_eq!(registry.position("apt-dpkg"), Some(0));
        assert_eq!(registry.position("gem"), Some(1));
        assert_eq!(registry.position("pip"), Some(2));
        assert_eq!(registry.position("npm"), None);
    }

    #[test]
    fn test_registry_defaults_include_language_managers() {
        let registry = PackageManagerRegistry::with_defaults("pacman");
        let ids: Vec<_> = registry.iter().collect();
        assert_eq!(ids, vec!["pacman", "gem", "pip"]);
    }

    #[test]
    fn test_registry_defaults_skip_managers_named_like_packages() {
        let registry = PackageManagerRegistry::with_defaults("apt-dpkg");
        for id in ["cargo", "flatpak", "snap", "aur"] {
            assert!(!registry.contains(id), "{} registered by default", id);
        }
    }
}
