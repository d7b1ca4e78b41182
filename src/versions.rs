use std::path::PathBuf;
use tracing::{debug, warn};
use crate::error::{GoenvError, Result};
use crate::manager::Goenv;
use crate::util::is_hidden;

/// One installed version: a subdirectory of the install root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationRecord {
    pub version: String,
    pub path: PathBuf,
    /// Derived from the active version detector, never stored.
    pub is_active: bool,
}

/// A version is used as a single directory name below the install root.
pub fn is_valid_version_name(version: &str) -> bool {
    !version.is_empty()
        && !version.starts_with('.')
        && !version.contains(['/', '\\'])
        && !version.chars().any(char::is_control)
}

pub(crate) fn ensure_valid_version_name(version: &str) -> Result<()> {
    if is_valid_version_name(version) {
        Ok(())
    }
    else {
        Err(GoenvError::Config(format!("Invalid version name: {version:?}")))
    }
}

impl Goenv {
    /// Lists installed versions sorted by name, marking the active one.
    ///
    /// The install root is created when missing.
    pub fn list_installed(&self) -> Result<Vec<InstallationRecord>> {
        let root = &self.config().install_root;
        if !root.exists() {
            std::fs::create_dir_all(root)?;
            debug!(path = %root.display(), "install root created");
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            let name = entry.file_name();
            if is_hidden(&name) || !entry.path().is_dir() {
                continue;
            }
            match name.into_string() {
                Ok(version) => versions.push(version),
                Err(name) => warn!(?name, "ignoring non UTF-8 directory in install root"),
            }
        }
        versions.sort();

        let active = self.active_version();
        Ok(versions
            .into_iter()
            .map(|version| InstallationRecord {
                path: root.join(&version),
                is_active: active.as_deref() == Some(version.as_str()),
                version,
            })
            .collect())
    }

    pub fn is_installed(&self, version: &str) -> bool {
        is_valid_version_name(version) && self.config().version_dir(version).is_dir()
    }

    pub fn active_version(&self) -> Option<String> {
        self.detector().active_version(&self.config().install_root)
    }
}
