//! Terminal emulator selection for interactive install commands.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::common::package::Error;
use crate::common::process::SearchPath;
use crate::common::shell::shell_join;

/// A terminal emulator found on the search path, together with how it takes
/// the command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCommand {
    /// GNOME Console; takes the command as one shell string.
    Kgx(PathBuf),
    /// GNOME Terminal; takes argv after `--`.
    GnomeTerminal(PathBuf),
    /// The xdg-terminal-exec launcher; takes argv directly.
    XdgTerminalExec(PathBuf),
}

/// Terminal emulators in order of preference
const TERMINALS: &[(&str, fn(PathBuf) -> TerminalCommand)] = &[
    ("kgx", TerminalCommand::Kgx),
    ("gnome-terminal", TerminalCommand::GnomeTerminal),
    ("xdg-terminal-exec", TerminalCommand::XdgTerminalExec),
];

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl TerminalCommand {
    /// Wrap `argv` so that it runs inside this terminal.
    pub fn wrap(&self, argv: &[String]) -> Vec<String> {
        match self {
            Self::Kgx(kgx) => vec![path_arg(kgx), format!("--command={}", shell_join(argv))],
            Self::GnomeTerminal(terminal) => {
                let mut wrapped = vec![path_arg(terminal), "--".to_string()];
                wrapped.extend_from_slice(argv);
                wrapped
            }
            Self::XdgTerminalExec(launcher) => {
                let mut wrapped = vec![path_arg(launcher)];
                wrapped.extend_from_slice(argv);
                wrapped
            }
        }
    }
}

/// Find the preferred terminal emulator available on `search_path`.
pub async fn find_terminal_command(
    search_path: &SearchPath,
    cancel: &CancellationToken,
) -> Result<Option<TerminalCommand>, Error> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    for (name, make) in TERMINALS {
        if let Some(path) = search_path.find(name) {
            debug!(terminal = %path.display(), "found terminal emulator");
            return Ok(Some(make(path)));
        }
    }

    debug!("no supported terminal emulator found");
    Ok(None)
}
