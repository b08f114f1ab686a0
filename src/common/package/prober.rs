//! Installer discovery.
//!
//! PackageKit is preferred when it actually works. `pkcon` is installed on
//! plenty of systems where it has no usable backend and still exits 0, so it
//! is only trusted after `pkcon backend-details` reports a backend that can
//! install packages. Otherwise the distribution's own tool is used through a
//! privilege helper.

use std::collections::BTreeSet;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{Error, InstallCommand, PackageManager};
use crate::common::config::Config;
use crate::common::process::{self, SearchPath};

const INSTALL_ROLE: &str = "install-packages";
const REFRESH_ROLE: &str = "refresh-cache";

/// Everything the prober needs to know about the machine.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub search_path: SearchPath,
    pub privilege_helper: String,
    pub skip_packagekit: bool,
    pub packagekit_cache_age: u32,
    /// Already root, so native tools run without a helper.
    pub running_as_root: bool,
}

impl ProbeSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            search_path: SearchPath::from_env(),
            privilege_helper: config.privilege_helper.clone(),
            skip_packagekit: config.skip_packagekit,
            packagekit_cache_age: config.packagekit_cache_age,
            running_as_root: matches!(sudo::check(), sudo::RunningAs::Root),
        }
    }
}

/// Parsed output of `pkcon backend-details`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDetails {
    pub name: String,
    pub roles: BTreeSet<String>,
}

impl BackendDetails {
    /// Parse the report. Returns `None` unless it starts with a non-empty
    /// `Name:` field.
    pub fn parse(output: &str) -> Option<Self> {
        if !output.starts_with("Name:") {
            return None;
        }

        let mut name = None;
        let mut roles = BTreeSet::new();

        for line in output.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            match key.trim() {
                "Name" => name = Some(value.trim().to_string()),
                "Roles" => {
                    roles = value
                        .split(|c: char| c == ';' || c == ',' || c.is_whitespace())
                        .filter(|role| !role.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                _ => {}
            }
        }

        let name = name.filter(|name| !name.is_empty())?;
        Some(Self { name, roles })
    }

    pub fn can_install(&self) -> bool {
        self.roles.contains(INSTALL_ROLE)
    }

    pub fn can_refresh(&self) -> bool {
        self.roles.contains(REFRESH_ROLE)
    }
}

fn not_functional(pkcon: &Path, reason: impl Into<String>) -> Error {
    Error::ToolNotFunctional {
        tool: pkcon.display().to_string(),
        reason: reason.into(),
    }
}

/// Check that `pkcon` has a working backend that can install packages.
pub async fn probe_packagekit(
    pkcon: &Path,
    cancel: &CancellationToken,
) -> Result<BackendDetails, Error> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let argv = vec![
        pkcon.to_string_lossy().into_owned(),
        "backend-details".to_string(),
    ];
    let output = process::capture_stdout(&argv, &[("LC_ALL", "C.UTF-8")], cancel).await?;

    if !output.status.success() {
        return Err(not_functional(pkcon, format!("backend-details {}", output.status)));
    }

    let details = BackendDetails::parse(&output.stdout).ok_or_else(|| {
        not_functional(pkcon, format!("unexpected backend-details output {:?}", output.stdout))
    })?;

    if !details.can_install() {
        return Err(not_functional(
            pkcon,
            format!("backend {} cannot install packages", details.name),
        ));
    }

    Ok(details)
}

/// Find the command that installs OS packages on this machine.
///
/// Tries PackageKit first, then the native tool of the first known family in
/// `chain`. Returns `None` when nothing usable is found.
pub async fn find_install_command<S: AsRef<str>>(
    settings: &ProbeSettings,
    chain: &[S],
    cancel: &CancellationToken,
) -> Result<Option<InstallCommand>, Error> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    if !settings.skip_packagekit
        && let Some(pkcon) = settings.search_path.find("pkcon")
    {
        match probe_packagekit(&pkcon, cancel).await {
            Ok(details) => {
                let refresh = details.can_refresh();
                debug!(backend = %details.name, refresh, "using PackageKit");
                return Ok(Some(InstallCommand::PackageKit {
                    pkcon,
                    cache_age: settings.packagekit_cache_age,
                    refresh: details.can_refresh(),
                }));
            }
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(err) => warn!("{err}"),
        }
    }

    find_native_install_command(settings, chain)
}

fn find_native_install_command<S: AsRef<str>>(
    settings: &ProbeSettings,
    chain: &[S],
) -> Result<Option<InstallCommand>, Error> {
    let helper = if settings.running_as_root {
        None
    } else {
        match settings.search_path.find(&settings.privilege_helper) {
            Some(helper) => Some(helper),
            None => {
                debug!(helper = %settings.privilege_helper, "privilege helper not found");
                return Ok(None);
            }
        }
    };

    for identifier in chain {
        let Some(manager) = PackageManager::for_identifier(identifier.as_ref()) else {
            continue;
        };

        if let Some(program) = settings.search_path.find_any(manager.binaries()) {
            debug!(%manager, program = %program.display(), "using native package manager");
            return Ok(Some(InstallCommand::Native {
                helper,
                manager,
                program,
            }));
        }

        debug!(%manager, "package manager not found on search path");
    }

    Ok(None)
}
