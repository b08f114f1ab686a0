//! Binding loaders.
//!
//! [`TypelibLoader`] looks for `<Namespace>-<version>.typelib` in the
//! GObject-Introspection search path, the same place the GI runtime looks.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::LoadError;

/// Header every compiled typelib starts with.
const TYPELIB_MAGIC: &[u8; 16] = b"GOBJ\nMETADATA\r\n\x1a";

const SYSTEM_TYPELIB_DIRS: &[&str] = &[
    "/usr/lib64/girepository-1.0",
    "/usr/lib/girepository-1.0",
    "/usr/local/lib64/girepository-1.0",
    "/usr/local/lib/girepository-1.0",
];

/// Multiarch layouts (Debian) keep typelibs under a triplet directory.
const MULTIARCH_TYPELIB_GLOB: &str = "/usr/lib/*/girepository-1.0";

/// Loads a binding by namespace and version.
///
/// Absence must be reported as [`LoadError::NotInstalled`]; every other
/// variant is treated as a genuine failure.
pub trait BindingLoader {
    type Handle;

    fn load(&self, namespace: &str, version: &str) -> Result<Self::Handle, LoadError>;
}

/// A typelib found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typelib {
    pub namespace: String,
    pub version: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct TypelibLoader {
    dirs: Vec<PathBuf>,
}

impl TypelibLoader {
    /// Search only `dirs`, in order.
    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Search `extra` first, then `GI_TYPELIB_PATH`, then the system
    /// directories.
    pub fn system(extra: &[PathBuf]) -> Self {
        let mut dirs: Vec<PathBuf> = extra.to_vec();

        if let Some(path) = std::env::var_os("GI_TYPELIB_PATH") {
            dirs.extend(std::env::split_paths(&path).filter(|p| !p.as_os_str().is_empty()));
        }

        dirs.extend(SYSTEM_TYPELIB_DIRS.iter().map(PathBuf::from));

        if let Ok(paths) = glob::glob(MULTIARCH_TYPELIB_GLOB) {
            dirs.extend(paths.flatten());
        }

        let mut unique = Vec::with_capacity(dirs.len());
        for dir in dirs {
            if !unique.contains(&dir) {
                unique.push(dir);
            }
        }

        Self { dirs: unique }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

fn check_header(path: &Path) -> Result<(), LoadError> {
    let io_error = |source: std::io::Error| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut header = [0u8; 16];
    let mut file = File::open(path).map_err(io_error)?;
    match file.read_exact(&mut header) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
            return Err(LoadError::Invalid {
                path: path.to_path_buf(),
            });
        }
        Err(err) => return Err(io_error(err)),
    }

    if &header != TYPELIB_MAGIC {
        return Err(LoadError::Invalid {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

impl BindingLoader for TypelibLoader {
    type Handle = Typelib;

    fn load(&self, namespace: &str, version: &str) -> Result<Typelib, LoadError> {
        let file_name = format!("{namespace}-{version}.typelib");

        for dir in &self.dirs {
            let path = dir.join(&file_name);
            match std::fs::metadata(&path) {
                Ok(meta) if meta.is_file() => {
                    check_header(&path)?;
                    debug!(path = %path.display(), "found typelib");
                    return Ok(Typelib {
                        namespace: namespace.to_string(),
                        version: version.to_string(),
                        path,
                    });
                }
                Ok(_) => continue,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(source) => return Err(LoadError::Io { path, source }),
            }
        }

        Err(LoadError::NotInstalled {
            namespace: namespace.to_string(),
            version: version.to_string(),
        })
    }
}

/// Write a minimal valid typelib. Shared by tests that need an installed one.
#[cfg(test)]
pub(crate) fn write_fake_typelib(dir: &Path, namespace: &str, version: &str) -> PathBuf {
    let path = dir.join(format!("{namespace}-{version}.typelib"));
    let mut content = TYPELIB_MAGIC.to_vec();
    content.extend_from_slice(&[0; 32]);
    std::fs::write(&path, content).unwrap();
    path
}
