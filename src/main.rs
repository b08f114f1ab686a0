mod commands;
mod common;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::*;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::commands::App;
use crate::common::package::{self, DependencyRequest};

/// Find and install the system packages behind optional GObject-Introspection bindings
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Config file to use instead of ~/.config/gideps/config.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read the platform identity from this os-release file
    #[arg(long, global = true, hide = true, value_name = "FILE")]
    os_release: Option<PathBuf>,

    /// Search only these directories for typelibs (repeatable)
    #[arg(long = "typelib-path", global = true, value_name = "DIR")]
    typelib_path: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the platform identity chain, most specific first
    Identity,

    /// Check that typelibs are installed
    Check {
        /// Typelibs as Namespace=version, e.g. Gtk=4.0
        #[arg(required = true, value_name = "NAMESPACE=VERSION")]
        requests: Vec<DependencyRequest>,
    },

    /// Install the packages providing missing typelibs
    Install {
        /// Typelibs as Namespace=version, e.g. Gtk=4.0
        #[arg(required = true, value_name = "NAMESPACE=VERSION")]
        requests: Vec<DependencyRequest>,
        /// Run the installer in a terminal emulator
        #[arg(short, long)]
        terminal: bool,
        /// Print the install command instead of running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the command that would install packages on this machine
    Command {
        /// Wrap the command in a terminal emulator
        #[arg(short, long)]
        terminal: bool,
        /// Package names
        packages: Vec<String>,
    },

    /// Show catalog entries and what they resolve to on this platform
    Catalog {
        /// Only show these typelibs
        #[arg(value_name = "NAMESPACE=VERSION")]
        requests: Vec<DependencyRequest>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the catalog against the packages installed on this machine
    Verify,
}

/// Log level: `--debug` forces debug, otherwise `RUST_LOG`, otherwise warnings only.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("gideps=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli, cancel: CancellationToken) -> anyhow::Result<()> {
    let app = App::new(
        cli.config.as_deref(),
        cli.os_release.as_deref(),
        &cli.typelib_path,
        cancel,
    )?;

    match cli.command {
        Commands::Identity => commands::handle_identity(&app),
        Commands::Check { requests } => commands::handle_check(&app, &requests),
        Commands::Install {
            requests,
            terminal,
            dry_run,
        } => commands::handle_install(&app, &requests, terminal, dry_run).await,
        Commands::Command { terminal, packages } => {
            commands::handle_command(&app, terminal, &packages).await
        }
        Commands::Catalog { requests, json } => commands::handle_catalog(&app, &requests, json),
        Commands::Verify => commands::handle_verify(&app),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    match run(cli, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let cancelled = err
                .downcast_ref::<package::Error>()
                .is_some_and(package::Error::is_cancelled);
            eprintln!("{} {err:#}", "Error:".red().bold());
            if cancelled {
                ExitCode::from(130)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
