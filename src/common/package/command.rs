//! Install command synthesis.
//!
//! An [`InstallCommand`] remembers which installer was found and turns a list
//! of package names into an argv. Package names are always discrete argv
//! elements, except inside the `refresh && install` scripts where each token
//! is quoted on its own.

use std::path::{Path, PathBuf};

use super::PackageManager;
use crate::common::shell::{and_then_script, shell_join};
use crate::common::terminal::TerminalCommand;

/// Shell used for the two-step `refresh && install` scripts.
pub const SHELL: &str = "/bin/sh";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallCommand {
    /// PackageKit's `pkcon`; authorization is handled by PackageKit itself.
    PackageKit {
        pkcon: PathBuf,
        cache_age: u32,
        /// The backend supports `refresh-cache`, so refresh first.
        refresh: bool,
    },
    /// The distribution's own tool, run through a privilege helper unless we
    /// are already root.
    Native {
        helper: Option<PathBuf>,
        manager: PackageManager,
        program: PathBuf,
    },
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl InstallCommand {
    /// The argv that installs `packages`.
    pub fn argv<S: AsRef<str>>(&self, packages: &[S]) -> Vec<String> {
        let packages = packages.iter().map(|p| p.as_ref().to_string());

        match self {
            Self::PackageKit {
                pkcon,
                cache_age,
                refresh,
            } => {
                let pkcon = path_arg(pkcon);
                let mut install = vec![
                    pkcon.clone(),
                    "install".to_string(),
                    "-c".to_string(),
                    cache_age.to_string(),
                ];
                install.extend(packages);

                if !refresh {
                    return install;
                }

                let refresh = [pkcon, "refresh".to_string()];
                let install = exec(install);
                vec![
                    SHELL.to_string(),
                    "-c".to_string(),
                    and_then_script(&[&refresh[..], &install[..]]),
                ]
            }
            Self::Native {
                helper,
                manager,
                program,
            } => {
                let program = path_arg(program);
                let mut argv: Vec<String> = helper.iter().map(|h| path_arg(h)).collect();

                match manager.refresh_args() {
                    // One script under one escalation, so the user is asked once.
                    Some(refresh_args) => {
                        let mut refresh = vec![program.clone()];
                        refresh.extend(refresh_args.iter().map(|a| a.to_string()));

                        let mut install = vec![program];
                        install.extend(manager.install_args().iter().map(|a| a.to_string()));
                        install.extend(packages);
                        let install = exec(install);

                        argv.push(SHELL.to_string());
                        argv.push("-c".to_string());
                        argv.push(and_then_script(&[&refresh[..], &install[..]]));
                    }
                    None => {
                        argv.push(program);
                        argv.extend(manager.install_args().iter().map(|a| a.to_string()));
                        argv.extend(packages);
                    }
                }

                argv
            }
        }
    }

    /// Short description of the installer for messages.
    pub fn describe(&self) -> String {
        match self {
            Self::PackageKit { .. } => "PackageKit".to_string(),
            Self::Native {
                helper: Some(helper),
                manager,
                ..
            } => format!("{manager} via {}", helper.display()),
            Self::Native { manager, .. } => manager.to_string(),
        }
    }
}

/// Prefix with `exec` so the shell is replaced by the final command.
fn exec(mut argv: Vec<String>) -> Vec<String> {
    argv.insert(0, "exec".to_string());
    argv
}

/// An install command that runs inside a terminal emulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalInstallCommand {
    pub terminal: TerminalCommand,
    pub install: InstallCommand,
}

impl TerminalInstallCommand {
    pub fn argv<S: AsRef<str>>(&self, packages: &[S]) -> Vec<String> {
        self.terminal.wrap(&self.install.argv(packages))
    }
}

/// Render an argv for display.
pub fn display_command(argv: &[String]) -> String {
    shell_join(argv)
}
