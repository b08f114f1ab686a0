use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::*;
use comfy_table::{Table, presets::UTF8_FULL};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::common::config::Config;
use crate::common::distro::OsRelease;
use crate::common::package::{
    ArtifactReason, Catalog, DependencyRequest, Engine, Ensured, InstallOptions,
    MissingDependencies, PackageManager, ProbeSettings, QueryTool, Resolution, TypelibLoader,
    Verification, display_command, verify_catalog,
};

/// Everything a command handler needs.
pub struct App {
    pub config: Config,
    pub engine: Engine<OsRelease>,
    pub loader: TypelibLoader,
    pub cancel: CancellationToken,
}

impl App {
    pub fn new(
        config_path: Option<&Path>,
        os_release: Option<&Path>,
        typelib_path: &[PathBuf],
        cancel: CancellationToken,
    ) -> Result<Self> {
        let config = Config::load(config_path)?;

        let platform = match os_release {
            Some(path) => OsRelease::from_path(path),
            None => OsRelease::detect(),
        };

        let loader = if typelib_path.is_empty() {
            TypelibLoader::system(&config.typelib_dirs)
        } else {
            TypelibLoader::with_dirs(typelib_path.to_vec())
        };
        debug!(dirs = ?loader.dirs(), "typelib search path");

        let engine = Engine::new(
            platform,
            Catalog::builtin(),
            ProbeSettings::from_config(&config),
        );

        Ok(Self {
            config,
            engine,
            loader,
            cancel,
        })
    }
}

pub fn handle_identity(app: &App) -> Result<()> {
    for identifier in app.engine.identity_chain() {
        println!("{identifier}");
    }
    Ok(())
}

fn install_hint(requests: &[DependencyRequest]) -> String {
    let args: Vec<String> = requests.iter().map(ToString::to_string).collect();
    format!("gideps install {}", args.join(" "))
}

pub fn handle_check(app: &App, requests: &[DependencyRequest]) -> Result<()> {
    match app.engine.resolve(requests, &app.loader) {
        Ok(found) => {
            for typelib in found.values() {
                println!(
                    "{} {} {} {}",
                    "✓".green(),
                    typelib.namespace.bold(),
                    typelib.version,
                    typelib.path.display().to_string().dimmed()
                );
            }
            Ok(())
        }
        Err(err) => {
            if err.missing().is_some_and(MissingDependencies::is_installable) {
                eprintln!("Run {} to install them.", install_hint(requests).cyan());
            }
            Err(err.into())
        }
    }
}

pub async fn handle_install(
    app: &App,
    requests: &[DependencyRequest],
    terminal: bool,
    dry_run: bool,
) -> Result<()> {
    let options = InstallOptions {
        terminal: terminal || app.config.use_terminal,
        dry_run,
    };

    let ensured = app
        .engine
        .ensure(requests, &app.loader, options, &app.cancel)
        .await?;

    match ensured {
        Ensured::Loaded(_) => {
            println!("{}", "All typelibs are already installed".green());
        }
        Ensured::Installed {
            packages,
            command,
            handles,
        } => {
            let packages: Vec<&str> = packages.iter().map(String::as_str).collect();
            println!("{} {}", "Installed".green().bold(), packages.join(", "));
            println!("  {}", display_command(&command).dimmed());
            for typelib in handles.values() {
                println!(
                    "  {} {} {}",
                    "✓".green(),
                    typelib.namespace.bold(),
                    typelib.path.display().to_string().dimmed()
                );
            }
        }
        Ensured::WouldInstall { missing, command } => {
            eprintln!("{}", missing.to_string().yellow());
            println!("{}", display_command(&command));
        }
    }

    Ok(())
}

pub async fn handle_command(app: &App, terminal: bool, packages: &[String]) -> Result<()> {
    let argv = app
        .engine
        .plan_install(packages, terminal, &app.cancel)
        .await?;
    println!("{}", display_command(&argv));
    Ok(())
}

#[derive(Serialize, Debug)]
struct CatalogRow {
    namespace: &'static str,
    version: &'static str,
    artifact: &'static str,
    status: &'static str,
    matched: Option<String>,
    packages: Vec<&'static str>,
}

impl CatalogRow {
    fn new(namespace: &'static str, version: &'static str, resolution: Resolution) -> Self {
        let artifact = resolution.artifact();
        let packages = resolution.packages().to_vec();
        let (status, matched) = match resolution {
            Resolution::Packages { matched, .. } => ("packages", Some(matched)),
            Resolution::Artifact {
                reason: ArtifactReason::Unavailable,
                ..
            } => ("unavailable", None),
            Resolution::Artifact {
                reason: ArtifactReason::Unknown,
                ..
            } => ("unknown", None),
        };

        Self {
            namespace,
            version,
            artifact,
            status,
            matched,
            packages,
        }
    }
}

pub fn handle_catalog(app: &App, requests: &[DependencyRequest], json: bool) -> Result<()> {
    let catalog = if requests.is_empty() {
        app.engine.catalog().clone()
    } else {
        app.engine.catalog().subset(requests)?
    };
    let chain = app.engine.identity_chain();

    let rows: Vec<CatalogRow> = catalog
        .entries()
        .map(|entry| CatalogRow::new(entry.namespace, entry.version, entry.resolve(chain)))
        .collect();

    if json {
        let output = serde_json::to_string_pretty(&rows).context("serializing catalog")?;
        println!("{output}");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Namespace", "Version", "Typelib", "Packages", "Matched"]);
    for row in &rows {
        let packages = match row.status {
            "packages" => row.packages.join(", "),
            other => format!("({other})"),
        };
        table.add_row(vec![
            row.namespace.to_string(),
            row.version.to_string(),
            row.artifact.to_string(),
            packages,
            row.matched.clone().unwrap_or_default(),
        ]);
    }

    println!("{table}");
    println!(
        "{} typelibs in {} namespaces, resolved for {}",
        rows.len(),
        catalog.namespaces().len(),
        chain.join(", ").bold()
    );
    Ok(())
}

pub fn handle_verify(app: &App) -> Result<()> {
    let chain = app.engine.identity_chain();
    let manager = PackageManager::for_chain(chain)
        .with_context(|| format!("No known package manager for {}", chain.join(", ")))?;
    let tool = QueryTool::find(manager, &app.engine.settings().search_path)?;

    println!("Verifying catalog with {}", manager.to_string().bold());
    for result in verify_catalog(app.engine.catalog(), chain, &tool)? {
        match result {
            Verification::Verified {
                entry,
                package,
                path,
            } => println!(
                "{} {} {} {}",
                "✓".green(),
                entry.artifact.bold(),
                package,
                path.dimmed()
            ),
            Verification::Skipped { entry, reason } => {
                let reason = match reason {
                    ArtifactReason::Unavailable => "unavailable on this platform",
                    ArtifactReason::Unknown => "no package for this platform",
                };
                println!("{} {} {}", "-".yellow(), entry.artifact, reason.dimmed());
            }
        }
    }

    Ok(())
}
