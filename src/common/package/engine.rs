//! The dependency engine ties identity, catalog, prober and terminal
//! selection together and runs the resolve → install → resolve flow.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::prober::{self, ProbeSettings};
use super::{
    BindingLoader, Catalog, DependencyRequest, Error, InstallCommand, MissingDependencies,
    TerminalInstallCommand, resolver,
};
use crate::common::distro::{PlatformInfo, identity_chain};
use crate::common::process;
use crate::common::shell::shell_join;
use crate::common::terminal::{self, TerminalCommand};

/// How [`Engine::ensure`] installs missing packages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Run the installer inside a terminal emulator.
    pub terminal: bool,
    /// Work out the command but don't run it.
    pub dry_run: bool,
}

/// Result of [`Engine::ensure`].
#[derive(Debug)]
pub enum Ensured<H> {
    /// Everything was already installed.
    Loaded(BTreeMap<String, H>),
    /// Missing packages were installed and every binding loaded afterwards.
    Installed {
        packages: BTreeSet<String>,
        command: Vec<String>,
        handles: BTreeMap<String, H>,
    },
    /// Dry run: the command that would have installed `missing`.
    WouldInstall {
        missing: MissingDependencies,
        command: Vec<String>,
    },
}

pub struct Engine<P> {
    platform: P,
    catalog: Catalog,
    settings: ProbeSettings,
    identity: OnceLock<Vec<String>>,
    install_command: OnceCell<Option<InstallCommand>>,
}

impl<P: PlatformInfo> Engine<P> {
    pub fn new(platform: P, catalog: Catalog, settings: ProbeSettings) -> Self {
        Self {
            platform,
            catalog,
            settings,
            identity: OnceLock::new(),
            install_command: OnceCell::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Identity chain of this platform, computed on first use.
    pub fn identity_chain(&self) -> &[String] {
        self.identity.get_or_init(|| {
            let chain = identity_chain(&self.platform);
            debug!(?chain, "platform identity");
            chain
        })
    }

    pub fn resolve<L: BindingLoader>(
        &self,
        requests: &[DependencyRequest],
        loader: &L,
    ) -> Result<BTreeMap<String, L::Handle>, Error> {
        resolver::resolve(&self.catalog, self.identity_chain(), requests, loader)
    }

    /// The install command for this machine.
    ///
    /// Probing happens once; the outcome, including "nothing found", is kept
    /// for the lifetime of the engine. Errors (such as cancellation) are not
    /// kept, so a later call probes again.
    pub async fn find_install_command(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<InstallCommand>, Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let command = self
            .install_command
            .get_or_try_init(|| {
                prober::find_install_command(&self.settings, self.identity_chain(), cancel)
            })
            .await?;
        Ok(command.clone())
    }

    pub async fn find_terminal_command(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<TerminalCommand>, Error> {
        terminal::find_terminal_command(&self.settings.search_path, cancel).await
    }

    /// Install command wrapped in a terminal; `None` unless both exist.
    pub async fn find_terminal_install_command(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<TerminalInstallCommand>, Error> {
        let Some(install) = self.find_install_command(cancel).await? else {
            return Ok(None);
        };
        let Some(terminal) = self.find_terminal_command(cancel).await? else {
            return Ok(None);
        };
        Ok(Some(TerminalInstallCommand { terminal, install }))
    }

    /// The argv that installs `packages`, optionally inside a terminal.
    pub async fn plan_install<S: AsRef<str>>(
        &self,
        packages: &[S],
        in_terminal: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, Error> {
        let install = self
            .find_install_command(cancel)
            .await?
            .ok_or(Error::NoInstallCommand)?;
        debug!(installer = %install.describe(), in_terminal, "planning install");

        if !in_terminal {
            return Ok(install.argv(packages));
        }

        let command = self
            .find_terminal_install_command(cancel)
            .await?
            .ok_or(Error::NoTerminal)?;
        Ok(command.argv(packages))
    }

    /// Make every request loadable, installing missing packages if needed.
    ///
    /// Missing files without a known package can't be installed and are
    /// returned as [`Error::MissingDependencies`] right away.
    pub async fn ensure<L: BindingLoader>(
        &self,
        requests: &[DependencyRequest],
        loader: &L,
        options: InstallOptions,
        cancel: &CancellationToken,
    ) -> Result<Ensured<L::Handle>, Error> {
        let missing = match self.resolve(requests, loader) {
            Ok(handles) => return Ok(Ensured::Loaded(handles)),
            Err(Error::MissingDependencies(missing)) => missing,
            Err(err) => return Err(err),
        };

        if !missing.is_installable() {
            return Err(missing.into());
        }

        let command = self
            .plan_install(&missing.package_list(), options.terminal, cancel)
            .await?;

        if options.dry_run {
            return Ok(Ensured::WouldInstall { missing, command });
        }

        let shown = shell_join(&command);
        info!(command = %shown, "installing missing packages");

        let status = process::run_inherited(&command, cancel).await?;
        if !status.success() {
            return Err(Error::CommandFailed {
                command: shown,
                status,
            });
        }

        let handles = self.resolve(requests, loader)?;
        Ok(Ensured::Installed {
            packages: missing.packages,
            command,
            handles,
        })
    }
}
