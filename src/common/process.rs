//! Cancellable subprocess helpers.
//!
//! Every child is spawned with `kill_on_drop(true)`. On cancellation the child
//! and everything it started are killed before the call returns, so install
//! scripts like `refresh && exec install` don't leave their first step behind.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use nix::sys::signal::{Signal, kill, killpg};
use nix::unistd::Pid;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::common::package::Error;
use crate::common::shell::shell_join;

/// Directories searched for executables.
///
/// Defaults to `$PATH`; tests point it at a directory of stub programs.
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    dirs: Option<OsString>,
}

impl SearchPath {
    /// Use the `PATH` of the current process.
    pub fn from_env() -> Self {
        Self { dirs: None }
    }

    /// Use an explicit `PATH`-style list of directories.
    pub fn new(dirs: impl Into<OsString>) -> Self {
        Self {
            dirs: Some(dirs.into()),
        }
    }

    /// Locate `program`, like `which`.
    pub fn find(&self, program: &str) -> Option<PathBuf> {
        let found = match &self.dirs {
            None => which::which(program),
            Some(dirs) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
                which::which_in(program, Some(dirs), cwd)
            }
        };
        found.ok()
    }

    /// Locate the first of `programs` that exists.
    pub fn find_any(&self, programs: &[&str]) -> Option<PathBuf> {
        programs.iter().find_map(|program| self.find(program))
    }
}

/// Exit status and standard output of a finished command.
#[derive(Debug)]
pub struct CapturedOutput {
    pub status: ExitStatus,
    pub stdout: String,
}

fn command_for(argv: &[String]) -> Result<Command, Error> {
    let (program, args) = argv.split_first().ok_or(Error::EmptyCommand)?;
    let mut command = Command::new(program);
    command.args(args).kill_on_drop(true);
    Ok(command)
}

fn spawn(mut command: Command, argv: &[String]) -> Result<Child, Error> {
    command.spawn().map_err(|source| Error::Spawn {
        program: argv[0].clone(),
        source,
    })
}

/// Kill a child that is still running and wait for it to be reaped.
async fn terminate(child: &mut Child) {
    if let Err(err) = child.kill().await {
        debug!(error = %err, "child already exited");
    }
}

/// Kill the process group `child` leads, then reap `child`.
///
/// Only valid for children spawned with `process_group(0)`.
async fn terminate_group(child: &mut Child) {
    if let Some(pid) = child.id()
        && let Err(err) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL)
    {
        debug!(error = %err, pid, "killing process group");
    }
    terminate(child).await;
}

/// Parent pid from the contents of `/proc/<pid>/stat`.
fn parent_pid(stat: &str) -> Option<i32> {
    // the command name is in parentheses and may contain spaces or ')'
    let fields = &stat[stat.rfind(')')? + 1..];
    fields.split_whitespace().nth(1)?.parse().ok()
}

fn children_of(parent: i32) -> Vec<i32> {
    let Ok(entries) = std::fs::read_dir("/proc") else {
        return Vec::new();
    };

    entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let pid: i32 = entry.file_name().to_str()?.parse().ok()?;
            let stat = std::fs::read_to_string(entry.path().join("stat")).ok()?;
            (parent_pid(&stat)? == parent).then_some(pid)
        })
        .collect()
}

/// Stop `root` and all of its descendants, returning their pids root first.
///
/// Each process is stopped before its children are listed, so nothing in the
/// tree can fork or get reparented while it is collected.
fn stop_tree(root: i32) -> Vec<i32> {
    let mut tree = vec![root];
    let _ = kill(Pid::from_raw(root), Signal::SIGSTOP);

    let mut next = 0;
    while next < tree.len() {
        for child in children_of(tree[next]) {
            if !tree.contains(&child) {
                let _ = kill(Pid::from_raw(child), Signal::SIGSTOP);
                tree.push(child);
            }
        }
        next += 1;
    }
    tree
}

/// Kill `child` and every process below it, then reap `child`.
///
/// Used for children that share our terminal and so can't get their own
/// process group.
async fn terminate_tree(child: &mut Child) {
    if let Some(pid) = child.id() {
        let tree = stop_tree(pid as i32);
        debug!(?tree, "killing process tree");
        for pid in tree.iter().skip(1) {
            if let Err(err) = kill(Pid::from_raw(*pid), Signal::SIGKILL) {
                debug!(error = %err, pid, "descendant already exited");
            }
        }
    }
    terminate(child).await;
}

/// Run `argv` with extra environment variables and capture its stdout.
///
/// Stderr goes to our stderr. A non-zero exit is not an error here; callers
/// decide what the status means.
pub async fn capture_stdout(
    argv: &[String],
    env: &[(&str, &str)],
    cancel: &CancellationToken,
) -> Result<CapturedOutput, Error> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let mut command = command_for(argv)?;
    command
        .envs(env.iter().copied())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .process_group(0);

    debug!(command = %shell_join(argv), "capturing output");
    let mut child = spawn(command, argv)?;
    let mut stdout = child.stdout.take().ok_or_else(|| Error::Spawn {
        program: argv[0].clone(),
        source: std::io::Error::other("stdout was not captured"),
    })?;
    let mut buf = Vec::new();

    let outcome = tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        result = async {
            stdout.read_to_end(&mut buf).await?;
            child.wait().await
        } => Some(result),
    };

    let Some(result) = outcome else {
        terminate_group(&mut child).await;
        return Err(Error::Cancelled);
    };

    let status = result.map_err(|source| Error::Wait {
        program: argv[0].clone(),
        source,
    })?;

    Ok(CapturedOutput {
        status,
        stdout: String::from_utf8_lossy(&buf).into_owned(),
    })
}

/// Run `argv` attached to our stdin/stdout/stderr and wait for it to exit.
///
/// The child stays in our process group so it can prompt on the terminal.
pub async fn run_inherited(
    argv: &[String],
    cancel: &CancellationToken,
) -> Result<ExitStatus, Error> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let mut command = command_for(argv)?;
    command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let mut child = spawn(command, argv)?;

    let outcome = tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        result = child.wait() => Some(result),
    };

    let Some(result) = outcome else {
        terminate_tree(&mut child).await;
        return Err(Error::Cancelled);
    };

    result.map_err(|source| Error::Wait {
        program: argv[0].clone(),
        source,
    })
}
