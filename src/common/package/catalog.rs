//! Typelib catalog: which distribution package provides which typelib.
//!
//! The catalog is a static table. Each entry lists platform identifiers in the
//! order they should be tried and the packages providing the typelib there.
//! [`CatalogEntry::resolve`] walks the identity chain against that list.

use std::collections::BTreeSet;

use super::{DependencyRequest, Error};
use crate::typelib;

/// Packages for one platform identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformPackages {
    /// Packages that provide the typelib on this platform. All of them are
    /// installed.
    Packages(&'static [&'static str]),
    /// The platform is known not to ship the library.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformEntry {
    pub identifier: &'static str,
    pub packages: PlatformPackages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub namespace: &'static str,
    pub version: &'static str,
    /// File name the loader looks for, e.g. `Gtk-4.0.typelib`.
    pub artifact: &'static str,
    pub platforms: &'static [PlatformEntry],
}

/// Why no package could be named for an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactReason {
    /// Nothing in the identity chain matched.
    Unknown,
    /// A matching platform entry says the library doesn't exist there.
    Unavailable,
}

/// Outcome of matching a catalog entry against an identity chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Packages {
        packages: &'static [&'static str],
        artifact: &'static str,
        /// Identity chain entry that matched.
        matched: String,
    },
    Artifact {
        artifact: &'static str,
        reason: ArtifactReason,
    },
}

impl Resolution {
    /// Candidate packages; empty for [`Resolution::Artifact`].
    pub fn packages(&self) -> &'static [&'static str] {
        match self {
            Self::Packages { packages, .. } => packages,
            Self::Artifact { .. } => &[],
        }
    }

    pub fn artifact(&self) -> &'static str {
        match self {
            Self::Packages { artifact, .. } | Self::Artifact { artifact, .. } => artifact,
        }
    }
}

impl CatalogEntry {
    pub fn matches(&self, namespace: &str, version: &str) -> bool {
        self.namespace == namespace && self.version == version
    }

    /// Resolve this entry for a platform.
    ///
    /// The chain is walked top to bottom and the first identifier with a
    /// platform entry wins.
    pub fn resolve<S: AsRef<str>>(&self, chain: &[S]) -> Resolution {
        for id in chain {
            let id = id.as_ref();
            let Some(entry) = self.platforms.iter().find(|p| p.identifier == id) else {
                continue;
            };

            return match entry.packages {
                PlatformPackages::Packages(packages) => Resolution::Packages {
                    packages,
                    artifact: self.artifact,
                    matched: id.to_string(),
                },
                PlatformPackages::Unavailable => Resolution::Artifact {
                    artifact: self.artifact,
                    reason: ArtifactReason::Unavailable,
                },
            };
        }

        Resolution::Artifact {
            artifact: self.artifact,
            reason: ArtifactReason::Unknown,
        }
    }
}

/// Lookup table from (namespace, version) to [`CatalogEntry`].
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<&'static CatalogEntry>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn builtin() -> Self {
        Self::new(TYPELIBS)
    }

    pub fn new(entries: &'static [CatalogEntry]) -> Self {
        Self {
            entries: entries.iter().collect(),
        }
    }

    /// Entry for `namespace`/`version`, if registered.
    pub fn rule(&self, namespace: &str, version: &str) -> Option<&'static CatalogEntry> {
        self.entries
            .iter()
            .copied()
            .find(|entry| entry.matches(namespace, version))
    }

    /// Like [`Catalog::rule`], but an unregistered pair is an error.
    pub fn require(&self, namespace: &str, version: &str) -> Result<&'static CatalogEntry, Error> {
        self.rule(namespace, version)
            .ok_or_else(|| Error::UnknownDependency {
                namespace: namespace.to_string(),
                version: version.to_string(),
            })
    }

    pub fn entries(&self) -> impl Iterator<Item = &'static CatalogEntry> + '_ {
        self.entries.iter().copied()
    }

    pub fn namespaces(&self) -> BTreeSet<&'static str> {
        self.entries.iter().map(|entry| entry.namespace).collect()
    }

    /// Catalog restricted to `requests`, in catalog order.
    ///
    /// Fails on the first request that isn't registered.
    pub fn subset(&self, requests: &[DependencyRequest]) -> Result<Self, Error> {
        for request in requests {
            self.require(&request.namespace, &request.version)?;
        }

        let entries = self
            .entries
            .iter()
            .copied()
            .filter(|entry| {
                requests
                    .iter()
                    .any(|request| entry.matches(&request.namespace, &request.version))
            })
            .collect();

        Ok(Self { entries })
    }
}

static TYPELIBS: &[CatalogEntry] = &[
    typelib!("Adw", "1", {
        "debian:10" => unavailable,
        "debian:11" => unavailable,
        "ubuntu:20.04" => unavailable,
        "alpine" => ["libadwaita"],
        "arch" => ["libadwaita"],
        "debian" => ["gir1.2-adw-1"],
        "fedora" => ["libadwaita"],
        "suse" => ["typelib-1_0-Adw-1"],
    }),
    typelib!("Gdk", "3.0", {
        "alpine" => ["gtk+3.0"],
        "arch" => ["gtk3"],
        "debian" => ["gir1.2-gtk-3.0"],
        "fedora" => ["gtk3"],
        "suse" => ["typelib-1_0-Gtk-3_0"],
    }),
    typelib!("Gdk", "4.0", {
        "debian:10" => unavailable,
        "ubuntu:20.04" => unavailable,
        "alpine" => ["gtk4.0"],
        "arch" => ["gtk4"],
        "debian" => ["gir1.2-gtk-4.0"],
        "fedora" => ["gtk4"],
        "suse" => ["typelib-1_0-Gtk-4_0"],
    }),
    typelib!("Gtk", "3.0", {
        "alpine" => ["gtk+3.0"],
        "arch" => ["gtk3"],
        "debian" => ["gir1.2-gtk-3.0"],
        "fedora" => ["gtk3"],
        "suse" => ["typelib-1_0-Gtk-3_0"],
    }),
    typelib!("Gtk", "4.0", {
        "debian:10" => unavailable,
        "ubuntu:20.04" => unavailable,
        "alpine" => ["gtk4.0"],
        "arch" => ["gtk4"],
        "debian" => ["gir1.2-gtk-4.0"],
        "fedora" => ["gtk4"],
        "suse" => ["typelib-1_0-Gtk-4_0"],
    }),
    typelib!("Handy", "1", {
        "alpine" => ["libhandy1"],
        "arch" => ["libhandy"],
        "debian" => ["gir1.2-handy-1"],
        "fedora" => ["libhandy"],
        "suse" => ["typelib-1_0-Handy-1_0"],
    }),
    typelib!("Pango", "1.0", {
        "alpine" => ["pango"],
        "arch" => ["pango"],
        "debian" => ["gir1.2-pango-1.0"],
        "fedora" => ["pango"],
        "suse" => ["typelib-1_0-Pango-1_0"],
    }),
    typelib!("Vte", "2.91", {
        "alpine" => ["vte3"],
        "arch" => ["vte3"],
        "debian" => ["gir1.2-vte-2.91"],
        "fedora" => ["vte291"],
        "suse" => ["typelib-1_0-Vte-2.91"],
    }),
    typelib!("Vte", "3.91", {
        "debian:10" => unavailable,
        "debian:11" => unavailable,
        "ubuntu:20.04" => unavailable,
        "ubuntu:22.04" => unavailable,
        "alpine" => ["vte3-gtk4"],
        "arch" => ["vte4"],
        "debian" => ["gir1.2-vte-3.91"],
        "fedora" => ["vte291-gtk4"],
        "suse" => ["typelib-1_0-Vte-3_91"],
    }),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::distro::{OsRelease, identity_chain};

    fn chain_for(content: &str) -> Vec<String> {
        identity_chain(&OsRelease::parse(content))
    }

    fn request(namespace: &str, version: &str) -> DependencyRequest {
        DependencyRequest::new(namespace, version)
    }

    #[test]
    fn test_rule_lookup() {
        let catalog = Catalog::builtin();
        let gtk = catalog.rule("Gtk", "4.0").unwrap();
        assert_eq!(gtk.artifact, "Gtk-4.0.typelib");
        assert!(catalog.rule("Gtk", "5.0").is_none());
        assert!(catalog.rule("Nope", "1").is_none());
    }

    #[test]
    fn test_unregistered_pair_is_error() {
        let err = Catalog::builtin().require("Nope", "1").unwrap_err();
        assert!(matches!(err, Error::UnknownDependency { .. }));
        assert_eq!(err.to_string(), "No definition for namespace Nope, version 1");
    }

    #[test]
    fn test_derivative_resolves_through_id_like() {
        let catalog = Catalog::builtin();
        let chain = chain_for("ID=linuxmint\nID_LIKE=ubuntu\nVERSION_ID=21.2");
        let resolution = catalog.rule("Gtk", "4.0").unwrap().resolve(&chain);

        assert_eq!(resolution.packages(), ["gir1.2-gtk-4.0"]);
        assert!(matches!(
            resolution,
            Resolution::Packages { ref matched, .. } if matched == "debian"
        ));
    }

    #[test]
    fn test_versioned_identifier_wins_over_family() {
        let catalog = Catalog::builtin();
        let chain = chain_for("ID=debian\nVERSION_ID=11");
        let resolution = catalog.rule("Adw", "1").unwrap().resolve(&chain);

        assert_eq!(
            resolution,
            Resolution::Artifact {
                artifact: "Adw-1.typelib",
                reason: ArtifactReason::Unavailable,
            }
        );
        assert!(resolution.packages().is_empty());

        let bookworm = chain_for("ID=debian\nVERSION_ID=12");
        assert_eq!(
            catalog.rule("Adw", "1").unwrap().resolve(&bookworm).packages(),
            ["gir1.2-adw-1"]
        );
    }

    #[test]
    fn test_unknown_platform_falls_back_to_artifact() {
        let catalog = Catalog::builtin();
        for entry in catalog.entries() {
            let resolution = entry.resolve(&["gentoo:2.15", "gentoo"]);
            assert_eq!(
                resolution,
                Resolution::Artifact {
                    artifact: entry.artifact,
                    reason: ArtifactReason::Unknown,
                }
            );
            assert!(resolution.packages().is_empty());
        }
    }

    #[test]
    fn test_every_entry_covers_all_families() {
        for entry in Catalog::builtin().entries() {
            assert_eq!(
                entry.artifact,
                format!("{}-{}.typelib", entry.namespace, entry.version)
            );
            for family in ["alpine", "arch", "debian", "fedora", "suse"] {
                assert!(
                    entry.resolve(&[family]).packages().len() == 1,
                    "{} {} has no package for {family}",
                    entry.namespace,
                    entry.version
                );
            }
        }
    }

    #[test]
    fn test_subset_keeps_only_requested_entries() {
        let catalog = Catalog::builtin();
        let subset = catalog
            .subset(&[request("Vte", "3.91"), request("Adw", "1")])
            .unwrap();

        let pairs: Vec<_> = subset
            .entries()
            .map(|entry| (entry.namespace, entry.version))
            .collect();
        assert_eq!(pairs, [("Adw", "1"), ("Vte", "3.91")]);
        assert_eq!(subset.namespaces().len(), 2);
    }

    #[test]
    fn test_subset_rejects_unknown_request() {
        let err = Catalog::builtin()
            .subset(&[request("Gtk", "4.0"), request("Gtk", "2.0")])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownDependency { ref version, .. } if version == "2.0"
        ));
    }
}
