mod common;
mod utils;

use anyhow::Result;
use common::TestEnvironment;
use utils::run_gideps_command;

const UBUNTU_JAMMY: &str = "NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\nVERSION_ID=\"22.04\"\n";
const FEDORA: &str = "NAME=\"Fedora Linux\"\nID=fedora\nVERSION_ID=40\n";
const ALPINE: &str = "NAME=\"Alpine Linux\"\nID=alpine\nVERSION_ID=3.19.1\n";
const DEBIAN_BULLSEYE: &str = "ID=debian\nVERSION_ID=\"11\"\n";

const BACKEND_DETAILS: &str = "Name:\tdnf\nRoles:\tinstall-packages;refresh-cache\n";

#[test]
fn test_identity_chain() -> Result<()> {
    let env = TestEnvironment::new(UBUNTU_JAMMY)?;

    let output = run_gideps_command(&env, &["identity"])?;
    assert_eq!(output.exit_code, 0, "identity failed: {}", output.stderr);
    assert_eq!(output.stdout, "ubuntu:22.04\nubuntu:22\nubuntu\ndebian\n");

    Ok(())
}

#[test]
fn test_check_installed() -> Result<()> {
    let env = TestEnvironment::new(FEDORA)?;
    let path = env.install_typelib("Gtk", "4.0")?;

    let output = run_gideps_command(&env, &["check", "Gtk=4.0"])?;
    assert_eq!(output.exit_code, 0, "check failed: {}", output.stderr);
    assert!(output.stdout.contains(&path.display().to_string()));

    Ok(())
}

#[test]
fn test_check_reports_missing_packages_and_files() -> Result<()> {
    let env = TestEnvironment::new(UBUNTU_JAMMY)?;
    env.install_typelib("Gtk", "4.0")?;

    let output = run_gideps_command(&env, &["check", "Gtk=4.0", "Adw=1", "Vte=3.91"])?;
    assert_eq!(output.exit_code, 1);
    assert!(
        output
            .stderr
            .contains("Missing packages: gir1.2-adw-1. Missing files: Vte-3.91.typelib."),
        "unexpected stderr: {}",
        output.stderr
    );

    Ok(())
}

#[test]
fn test_check_suggests_install() -> Result<()> {
    let env = TestEnvironment::new(FEDORA)?;

    let output = run_gideps_command(&env, &["check", "Gtk=4.0"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("Missing packages: gtk4."));
    assert!(output.stderr.contains("gideps install Gtk=4.0"));

    Ok(())
}

#[test]
fn test_invalid_request_is_usage_error() -> Result<()> {
    let env = TestEnvironment::new(FEDORA)?;

    let output = run_gideps_command(&env, &["check", "Gtk"])?;
    assert_eq!(output.exit_code, 2);
    assert!(
        output
            .stderr
            .contains("Invalid argument Gtk: should be in namespace=version format")
    );

    Ok(())
}

#[test]
fn test_unknown_typelib() -> Result<()> {
    let env = TestEnvironment::new(FEDORA)?;

    let output = run_gideps_command(&env, &["check", "Nope=1"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("No definition for namespace Nope, version 1"));

    Ok(())
}

#[test]
fn test_install_dry_run() -> Result<()> {
    let env = TestEnvironment::new(ALPINE)?;
    let marker = env.path().join("apk-ran");
    env.stub("pkexec", "exec \"$@\"")?;
    env.stub("apk", &format!("touch {}", marker.display()))?;

    let output = run_gideps_command(&env, &["install", "--dry-run", "Gtk=4.0", "Vte=2.91"])?;
    assert_eq!(output.exit_code, 0, "install failed: {}", output.stderr);
    assert!(
        output.stdout.trim_end().ends_with("/apk -U add gtk4.0 vte3"),
        "unexpected command: {}",
        output.stdout
    );
    assert!(output.stderr.contains("Missing packages: gtk4.0, vte3."));
    assert!(!marker.exists());

    Ok(())
}

#[test]
fn test_install_runs_installer_and_rechecks() -> Result<()> {
    let env = TestEnvironment::new(ALPINE)?;
    let log = env.path().join("apk.log");
    env.stub("pkexec", "exec \"$@\"")?;
    env.stub(
        "apk",
        &format!(
            "echo \"$@\" >> {log}\nprintf 'GOBJ\\nMETADATA\\r\\n\\032' > {dir}/Gtk-4.0.typelib",
            log = log.display(),
            dir = env.typelib_dir().display()
        ),
    )?;

    let output = run_gideps_command(&env, &["install", "Gtk=4.0"])?;
    assert_eq!(output.exit_code, 0, "install failed: {}", output.stderr);
    assert!(output.stdout.contains("Installed gtk4.0"));
    assert_eq!(std::fs::read_to_string(&log)?, "-U add gtk4.0\n");

    let output = run_gideps_command(&env, &["install", "Gtk=4.0"])?;
    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.contains("already installed"));

    Ok(())
}

#[test]
fn test_install_reports_failing_installer() -> Result<()> {
    let env = TestEnvironment::new(ALPINE)?;
    env.stub("pkexec", "exec \"$@\"")?;
    env.stub("apk", "exit 3")?;

    let output = run_gideps_command(&env, &["install", "Gtk=4.0"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("apk -U add gtk4.0` failed"));

    Ok(())
}

#[test]
fn test_install_refuses_unavailable_typelib() -> Result<()> {
    let env = TestEnvironment::new(DEBIAN_BULLSEYE)?;
    env.stub("pkexec", "exec \"$@\"")?;
    env.stub("apt", "exit 0")?;

    let output = run_gideps_command(&env, &["install", "--dry-run", "Adw=1"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("Missing files: Adw-1.typelib."));
    assert!(output.stdout.is_empty());

    Ok(())
}

#[test]
fn test_command_prefers_working_packagekit() -> Result<()> {
    let env = TestEnvironment::new(FEDORA)?;
    env.stub("pkexec", "exec \"$@\"")?;
    env.stub("dnf", "exit 0")?;
    let pkcon = env.stub("pkcon", &format!("printf '{BACKEND_DETAILS}'"))?;
    std::fs::write(env.config(), "packagekit_cache_age = 5\n")?;

    let output = run_gideps_command(&env, &["command", "gtk4"])?;
    assert_eq!(output.exit_code, 0, "command failed: {}", output.stderr);

    let words = shell_words::split(output.stdout.trim_end())?;
    let pkcon = pkcon.display().to_string();
    assert_eq!(words[..2], ["/bin/sh", "-c"]);
    assert_eq!(
        shell_words::split(&words[2])?,
        [pkcon.as_str(), "refresh", "&&", "exec", pkcon.as_str(), "install", "-c", "5", "gtk4"]
    );

    Ok(())
}

#[test]
fn test_command_skips_broken_packagekit() -> Result<()> {
    let env = TestEnvironment::new(FEDORA)?;
    env.stub("pkexec", "exec \"$@\"")?;
    env.stub("dnf", "exit 0")?;
    env.stub("pkcon", "echo 'Failed to get daemon state'")?;

    let output = run_gideps_command(&env, &["command", "gtk4"])?;
    assert_eq!(output.exit_code, 0, "command failed: {}", output.stderr);
    assert!(output.stdout.trim_end().ends_with("/dnf install gtk4"));
    assert!(output.stderr.contains("doesn't seem to work"));

    Ok(())
}

#[test]
fn test_command_in_terminal() -> Result<()> {
    let env = TestEnvironment::new(FEDORA)?;
    env.stub("pkexec", "exec \"$@\"")?;
    env.stub("dnf", "exit 0")?;

    let output = run_gideps_command(&env, &["command", "--terminal", "gtk4"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("No supported terminal emulator found"));

    let terminal = env.stub("gnome-terminal", "exit 0")?;
    let output = run_gideps_command(&env, &["command", "--terminal", "gtk4"])?;
    assert_eq!(output.exit_code, 0, "command failed: {}", output.stderr);
    assert!(
        output
            .stdout
            .starts_with(&format!("{} -- ", terminal.display()))
    );

    Ok(())
}

#[test]
fn test_command_without_installer() -> Result<()> {
    let env = TestEnvironment::new("ID=gentoo\n")?;
    env.stub("pkexec", "exec \"$@\"")?;

    let output = run_gideps_command(&env, &["command", "gtk"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("No supported package installer found"));

    Ok(())
}

#[test]
fn test_catalog_json() -> Result<()> {
    let env = TestEnvironment::new(DEBIAN_BULLSEYE)?;

    let output = run_gideps_command(&env, &["catalog", "--json", "Adw=1", "Gtk=4.0"])?;
    assert_eq!(output.exit_code, 0, "catalog failed: {}", output.stderr);

    let rows: serde_json::Value = serde_json::from_str(&output.stdout)?;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0]["namespace"], "Adw");
    assert_eq!(rows[0]["status"], "unavailable");
    assert_eq!(rows[0]["packages"], serde_json::json!([]));

    assert_eq!(rows[1]["namespace"], "Gtk");
    assert_eq!(rows[1]["status"], "packages");
    assert_eq!(rows[1]["matched"], "debian");
    assert_eq!(rows[1]["packages"], serde_json::json!(["gir1.2-gtk-4.0"]));

    Ok(())
}

#[test]
fn test_malformed_config() -> Result<()> {
    let env = TestEnvironment::new(FEDORA)?;
    std::fs::write(env.config(), "skip_packagekit = [\n")?;

    let output = run_gideps_command(&env, &["identity"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("parsing config"));

    Ok(())
}
