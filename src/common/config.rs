use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::common::paths;

fn default_privilege_helper() -> String {
    "pkexec".to_string()
}

fn default_packagekit_cache_age() -> u32 {
    1000
}

/// User configuration, `~/.config/gideps/config.toml`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Program used to run the native package manager as root
    #[serde(default = "default_privilege_helper")]
    pub privilege_helper: String,
    /// Never use PackageKit, go straight to the native package manager
    pub skip_packagekit: bool,
    /// Passed to `pkcon install -c`
    #[serde(default = "default_packagekit_cache_age")]
    pub packagekit_cache_age: u32,
    /// Run installs in a terminal emulator by default
    pub use_terminal: bool,
    /// Searched for typelibs before the system directories
    pub typelib_dirs: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            privilege_helper: default_privilege_helper(),
            skip_packagekit: false,
            packagekit_cache_age: default_packagekit_cache_age(),
            use_terminal: false,
            typelib_dirs: Vec::new(),
        }
    }
}

impl Config {
    /// Load the config from `path`, or the default location when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => paths::config_file_path()?,
        };
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Result<Config> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Config::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()));
            }
        };

        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }
}
