//! Error types for dependency resolution and installation.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Failure reported by a [`BindingLoader`](super::BindingLoader).
#[derive(Error, Debug)]
pub enum LoadError {
    /// The requested namespace/version is not installed. This is the only
    /// variant the resolver turns into a missing-package report.
    #[error("Requiring {namespace}, version {version}: typelib not found")]
    NotInstalled { namespace: String, version: String },

    #[error("Failed to read typelib {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid typelib", path.display())]
    Invalid { path: PathBuf },
}

impl LoadError {
    pub fn is_not_installed(&self) -> bool {
        matches!(self, Self::NotInstalled { .. })
    }
}

/// Packages and files that have to be installed before the requested
/// bindings can load.
///
/// Only ever constructed with at least one non-empty set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDependencies {
    pub packages: BTreeSet<String>,
    pub artifacts: BTreeSet<String>,
}

impl MissingDependencies {
    pub(crate) fn new(packages: BTreeSet<String>, artifacts: BTreeSet<String>) -> Option<Self> {
        if packages.is_empty() && artifacts.is_empty() {
            return None;
        }
        Some(Self {
            packages,
            artifacts,
        })
    }

    /// Whether every missing dependency maps to a known package.
    pub fn is_installable(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn package_list(&self) -> Vec<String> {
        self.packages.iter().cloned().collect()
    }
}

impl fmt::Display for MissingDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if !self.packages.is_empty() {
            let packages: Vec<&str> = self.packages.iter().map(String::as_str).collect();
            parts.push(format!("Missing packages: {}.", packages.join(", ")));
        }

        if !self.artifacts.is_empty() {
            let files: Vec<&str> = self.artifacts.iter().map(String::as_str).collect();
            parts.push(format!("Missing files: {}.", files.join(", ")));
        }

        write!(f, "{}", parts.join(" "))
    }
}

impl std::error::Error for MissingDependencies {}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    MissingDependencies(#[from] MissingDependencies),

    #[error("No definition for namespace {namespace}, version {version}")]
    UnknownDependency { namespace: String, version: String },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("{tool} doesn't seem to work: {reason}")]
    ToolNotFunctional { tool: String, reason: String },

    #[error("No supported package installer found")]
    NoInstallCommand,

    #[error("No supported terminal emulator found")]
    NoTerminal,

    #[error("Cannot run an empty command")]
    EmptyCommand,

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` failed: {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("Operation was cancelled")]
    Cancelled,
}

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn missing(&self) -> Option<&MissingDependencies> {
        match self {
            Self::MissingDependencies(missing) => Some(missing),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_missing_dependencies_is_none() {
        assert!(MissingDependencies::new(BTreeSet::new(), BTreeSet::new()).is_none());
    }

    #[test]
    fn test_message_packages_only() {
        let missing = MissingDependencies::new(set(&["libbar2"]), BTreeSet::new()).unwrap();
        assert_eq!(missing.to_string(), "Missing packages: libbar2.");
        assert!(missing.is_installable());
    }

    #[test]
    fn test_message_packages_and_files() {
        let missing =
            MissingDependencies::new(set(&["gtk4", "libadwaita"]), set(&["Vte-3.91.typelib"]))
                .unwrap();
        assert_eq!(
            missing.to_string(),
            "Missing packages: gtk4, libadwaita. Missing files: Vte-3.91.typelib."
        );
        assert!(!missing.is_installable());
    }

    #[test]
    fn test_message_files_only() {
        let missing = MissingDependencies::new(BTreeSet::new(), set(&["Adw-1.typelib"])).unwrap();
        assert_eq!(missing.to_string(), "Missing files: Adw-1.typelib.");
    }

    #[test]
    fn test_load_error_discrimination() {
        let not_installed = LoadError::NotInstalled {
            namespace: "Gtk".into(),
            version: "4.0".into(),
        };
        let invalid = LoadError::Invalid {
            path: PathBuf::from("/tmp/Gtk-4.0.typelib"),
        };
        assert!(not_installed.is_not_installed());
        assert!(!invalid.is_not_installed());
    }
}
