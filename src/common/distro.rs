//! Platform identity from os-release metadata.
//!
//! The identity chain is the ordered list of identifiers used to look up
//! distribution packages, most specific first. For Ubuntu 22.04 it is
//! `ubuntu:22.04`, `ubuntu:22`, `ubuntu`, `debian`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

/// The os-release `ID` assumed when the field is missing.
const DEFAULT_ID: &str = "linux";

const OS_RELEASE_PATHS: &[&str] = &["/etc/os-release", "/usr/lib/os-release"];

/// Read-only access to the OS identity fields (`ID`, `ID_LIKE`, `VERSION_ID`).
pub trait PlatformInfo {
    fn field(&self, key: &str) -> Option<String>;
}

/// Parsed os-release file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    fields: HashMap<String, String>,
}

impl OsRelease {
    /// Read the system os-release file. A missing or unreadable file yields an
    /// empty set of fields.
    pub fn detect() -> Self {
        for path in OS_RELEASE_PATHS {
            if let Ok(content) = fs::read_to_string(path) {
                return Self::parse(&content);
            }
        }
        debug!("no os-release file found");
        Self::default()
    }

    pub fn from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "failed to read os-release");
                Self::default()
            }
        }
    }

    /// Parse os-release content
    pub fn parse(content: &str) -> Self {
        let fields = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), unquote(value.trim())))
            .collect();

        Self { fields }
    }
}

fn unquote(value: &str) -> String {
    let stripped = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    stripped.replace("\\\"", "\"").replace("\\\\", "\\")
}

impl PlatformInfo for OsRelease {
    fn field(&self, key: &str) -> Option<String> {
        self.fields.get(key).cloned()
    }
}

fn non_empty_field(info: &dyn PlatformInfo, key: &str) -> Option<String> {
    info.field(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Build the identity chain for `info`.
///
/// `id:VERSION_ID` and its dot-truncated prefixes come first, then the bare
/// `id`, then every `ID_LIKE` token. Ubuntu derivatives often leave `debian`
/// out of `ID_LIKE`, so it is appended when `ubuntu` is present without it.
/// The result is never empty.
pub fn identity_chain(info: &dyn PlatformInfo) -> Vec<String> {
    let id = non_empty_field(info, "ID")
        .map(|id| id.to_lowercase())
        .unwrap_or_else(|| DEFAULT_ID.to_string());

    let mut chain: Vec<String> = Vec::new();

    if let Some(version) = non_empty_field(info, "VERSION_ID") {
        let mut version = version.as_str();
        loop {
            chain.push(format!("{id}:{version}"));
            match version.rsplit_once('.') {
                Some((prefix, _)) if !prefix.is_empty() => version = prefix,
                _ => break,
            }
        }
    }

    if chain.last() != Some(&id) {
        chain.push(id);
    }

    if let Some(id_like) = info.field("ID_LIKE") {
        for like in id_like.split_whitespace() {
            let like = like.to_lowercase();
            if !chain.contains(&like) {
                chain.push(like);
            }
        }
    }

    let has = |name: &str| chain.iter().any(|entry| entry == name);
    if has("ubuntu") && !has("debian") {
        chain.push("debian".to_string());
    }

    chain
}
