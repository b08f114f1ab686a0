//! Optional GObject-Introspection dependencies.
//!
//! A [`DependencyRequest`] names a typelib by namespace and version. The
//! [`Catalog`] knows which distribution package ships each typelib, the
//! resolver reports what is missing, and the [`Engine`] finds an installer
//! for this machine and runs it.
//!
//! # Example
//!
//! ```ignore
//! use crate::common::package::{Catalog, Engine, InstallOptions, TypelibLoader};
//!
//! let engine = Engine::new(OsRelease::detect(), Catalog::builtin(), settings);
//! let requests = ["Gtk=4.0".parse()?, "Adw=1".parse()?];
//! engine
//!     .ensure(&requests, &TypelibLoader::system(&[]), InstallOptions::default(), &cancel)
//!     .await?;
//! ```

mod catalog;
mod command;
mod engine;
mod error;
mod loader;
mod macros;
mod manager;
mod prober;
mod resolver;
mod verify;

pub use catalog::{
    ArtifactReason, Catalog, CatalogEntry, PlatformEntry, PlatformPackages, Resolution,
};
pub use command::{InstallCommand, TerminalInstallCommand, display_command};
pub use engine::{Engine, Ensured, InstallOptions};
pub use error::{Error, LoadError, MissingDependencies};
pub use loader::{BindingLoader, TypelibLoader};
pub use manager::PackageManager;
pub use prober::ProbeSettings;
pub use resolver::DependencyRequest;
pub use verify::{QueryTool, Verification, verify_catalog};

#[cfg(test)]
pub(crate) use loader::write_fake_typelib;
