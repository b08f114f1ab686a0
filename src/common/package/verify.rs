//! Check the catalog against the packages actually installed on this machine.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use duct::cmd;

use super::{ArtifactReason, Catalog, CatalogEntry, PackageManager, Resolution};
use crate::common::process::SearchPath;

/// Lists the files owned by an installed package.
pub trait PackageFiles {
    fn files(&self, package: &str) -> Result<Vec<String>>;
}

/// [`PackageFiles`] backed by the package database query tool of a family.
#[derive(Debug, Clone)]
pub struct QueryTool {
    manager: PackageManager,
    program: PathBuf,
}

impl QueryTool {
    pub fn find(manager: PackageManager, search_path: &SearchPath) -> Result<Self> {
        let argv = manager.list_files_command("");
        let program = search_path
            .find(&argv[0])
            .with_context(|| format!("{} not found, cannot query {manager} packages", argv[0]))?;
        Ok(Self { manager, program })
    }
}

impl PackageFiles for QueryTool {
    fn files(&self, package: &str) -> Result<Vec<String>> {
        let argv = self.manager.list_files_command(package);
        let output = cmd(&self.program, &argv[1..])
            .stderr_null()
            .read()
            .with_context(|| format!("Failed to list files of {package}"))?;
        Ok(output.lines().map(str::to_string).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// `package` ships `path`.
    Verified {
        entry: &'static CatalogEntry,
        package: &'static str,
        path: String,
    },
    /// No package to check on this platform.
    Skipped {
        entry: &'static CatalogEntry,
        reason: ArtifactReason,
    },
}

fn provides(files: &[String], artifact: &str) -> Option<String> {
    files
        .iter()
        .find(|file| Path::new(file).file_name().is_some_and(|name| name == artifact))
        .cloned()
}

/// Verify every entry of `catalog` for the platform described by `chain`.
///
/// Stops at the first entry whose packages don't ship its typelib.
pub fn verify_catalog<S: AsRef<str>>(
    catalog: &Catalog,
    chain: &[S],
    files: &dyn PackageFiles,
) -> Result<Vec<Verification>> {
    let mut results = Vec::new();

    for entry in catalog.entries() {
        let packages = match entry.resolve(chain) {
            Resolution::Packages { packages, .. } => packages,
            Resolution::Artifact { reason, .. } => {
                results.push(Verification::Skipped { entry, reason });
                continue;
            }
        };

        let mut verified = None;
        for package in packages {
            let owned = files.files(package)?;
            if let Some(path) = provides(&owned, entry.artifact) {
                verified = Some(Verification::Verified {
                    entry,
                    package,
                    path,
                });
                break;
            }
        }

        match verified {
            Some(verification) => results.push(verification),
            None => bail!(
                "{} is not provided by {}",
                entry.artifact,
                packages.join(", ")
            ),
        }
    }

    Ok(results)
}
