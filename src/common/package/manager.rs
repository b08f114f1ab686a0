//! Distribution package managers and how to drive them.

/// Native package manager of a distribution family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    /// apk - Alpine
    Apk,
    /// Pacman - Arch Linux family
    Pacman,
    /// APT - Debian/Ubuntu family
    Apt,
    /// DNF (or yum) - Fedora/RHEL family
    Dnf,
    /// Zypper - openSUSE/SLES
    Zypper,
}

impl PackageManager {
    /// The package manager for a bare family identifier from the identity
    /// chain. Versioned identifiers (`debian:12`) never match.
    pub fn for_identifier(identifier: &str) -> Option<Self> {
        match identifier {
            "alpine" => Some(Self::Apk),
            "arch" => Some(Self::Pacman),
            "debian" => Some(Self::Apt),
            "fedora" => Some(Self::Dnf),
            "suse" => Some(Self::Zypper),
            _ => None,
        }
    }

    /// First identifier in `chain` that names a known family.
    pub fn for_chain<S: AsRef<str>>(chain: &[S]) -> Option<Self> {
        chain
            .iter()
            .find_map(|identifier| Self::for_identifier(identifier.as_ref()))
    }

    /// Executable names, preferred first.
    pub fn binaries(&self) -> &'static [&'static str] {
        match self {
            Self::Apk => &["apk"],
            Self::Pacman => &["pacman"],
            Self::Apt => &["apt", "apt-get"],
            Self::Dnf => &["dnf", "yum"],
            Self::Zypper => &["zypper"],
        }
    }

    /// Arguments placed between the program and the package names.
    pub fn install_args(&self) -> &'static [&'static str] {
        match self {
            Self::Apk => &["-U", "add"],
            Self::Pacman => &["-Sy"],
            Self::Apt | Self::Dnf | Self::Zypper => &["install"],
        }
    }

    /// Separate metadata refresh that has to run before installing.
    ///
    /// Only APT needs one; the others refresh as part of `install_args`.
    pub fn refresh_args(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::Apt => Some(&["update"]),
            _ => None,
        }
    }

    /// Command listing the files owned by an installed package.
    pub fn list_files_command(&self, package: &str) -> Vec<String> {
        let base: &[&str] = match self {
            Self::Apk => &["apk", "info", "-Lq"],
            Self::Pacman => &["pacman", "-Qql"],
            Self::Apt => &["dpkg-query", "-L"],
            Self::Dnf | Self::Zypper => &["rpm", "-ql", "--whatprovides"],
        };
        base.iter()
            .map(|arg| arg.to_string())
            .chain(std::iter::once(package.to_string()))
            .collect()
    }

    /// Get a human-readable name for this package manager.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Apk => "apk",
            Self::Pacman => "Pacman",
            Self::Apt => "APT",
            Self::Dnf => "DNF",
            Self::Zypper => "Zypper",
        }
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
