use anyhow::Result;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Header of a compiled typelib
pub const TYPELIB_MAGIC: &[u8] = b"GOBJ\nMETADATA\r\n\x1a";

/// A fake machine: os-release file, a bin directory used as `PATH`, a typelib
/// directory and a config path that doesn't exist until written.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new(os_release: &str) -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        std::fs::create_dir(temp_dir.path().join("bin"))?;
        std::fs::create_dir(temp_dir.path().join("typelibs"))?;
        std::fs::write(temp_dir.path().join("os-release"), os_release)?;
        Ok(Self { temp_dir })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.path().join("bin")
    }

    pub fn typelib_dir(&self) -> PathBuf {
        self.path().join("typelibs")
    }

    pub fn os_release(&self) -> PathBuf {
        self.path().join("os-release")
    }

    pub fn config(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    /// Add an executable shell script to the bin directory
    pub fn stub(&self, name: &str, body: &str) -> Result<PathBuf> {
        let path = self.bin_dir().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }

    /// Install a typelib into the typelib directory
    pub fn install_typelib(&self, namespace: &str, version: &str) -> Result<PathBuf> {
        let path = self
            .typelib_dir()
            .join(format!("{namespace}-{version}.typelib"));
        std::fs::write(&path, TYPELIB_MAGIC)?;
        Ok(path)
    }
}
