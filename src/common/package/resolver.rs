//! Dependency resolution: load every requested binding or report exactly
//! which packages and files are missing.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use super::{BindingLoader, Catalog, Error, MissingDependencies, Resolution};

/// One optional binding, e.g. `Gtk` version `4.0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DependencyRequest {
    pub namespace: String,
    pub version: String,
}

impl DependencyRequest {
    pub fn new(namespace: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for DependencyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.namespace, self.version)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid argument {0}: should be in namespace=version format")]
pub struct ParseRequestError(String);

impl FromStr for DependencyRequest {
    type Err = ParseRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(namespace), Some(version), None)
                if !namespace.is_empty() && !version.is_empty() =>
            {
                Ok(Self::new(namespace, version))
            }
            _ => Err(ParseRequestError(s.to_string())),
        }
    }
}

/// Load every request through `loader`.
///
/// Requests that fail with [`LoadError::NotInstalled`](super::LoadError) are
/// looked up in the catalog and collected; any other load failure is returned
/// as is. When something is missing the error lists all candidate packages
/// and unresolvable artifacts of the failed requests.
pub fn resolve<L: BindingLoader>(
    catalog: &Catalog,
    chain: &[String],
    requests: &[DependencyRequest],
    loader: &L,
) -> Result<BTreeMap<String, L::Handle>, Error> {
    let mut found = BTreeMap::new();
    let mut packages = BTreeSet::new();
    let mut artifacts = BTreeSet::new();

    for request in requests {
        let entry = catalog.require(&request.namespace, &request.version)?;

        let error = match loader.load(&request.namespace, &request.version) {
            Ok(handle) => {
                found.insert(request.namespace.clone(), handle);
                continue;
            }
            Err(error) => error,
        };

        if !error.is_not_installed() {
            return Err(error.into());
        }

        match entry.resolve(chain) {
            Resolution::Packages {
                packages: candidates,
                matched,
                ..
            } => {
                debug!(%request, %matched, ?candidates, "binding not installed");
                packages.extend(candidates.iter().map(|p| p.to_string()));
            }
            Resolution::Artifact { artifact, reason } => {
                debug!(%request, artifact, ?reason, "binding not installed, no known package");
                artifacts.insert(artifact.to_string());
            }
        }
    }

    match MissingDependencies::new(packages, artifacts) {
        Some(missing) => Err(missing.into()),
        None => Ok(found),
    }
}
