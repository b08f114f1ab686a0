use anyhow::Result;
use std::process::Command;

use super::common::TestEnvironment;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Run the gideps binary against the fake machine in `env`
pub fn run_gideps_command(env: &TestEnvironment, args: &[&str]) -> Result<CommandOutput> {
    let output = Command::new(env!("CARGO_BIN_EXE_gideps"))
        .arg("--config")
        .arg(env.config())
        .arg("--os-release")
        .arg(env.os_release())
        .arg("--typelib-path")
        .arg(env.typelib_dir())
        .args(args)
        .env("PATH", env.bin_dir())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}
