//! Strategies for finding the currently active version.
//!
//! Not finding one is a normal state, so detectors return `Option` and never
//! fail. A detector only reports a version whose installation directory exists.

use std::path::{Component, Path, PathBuf};
use std::process::Command;
use tracing::debug;
use crate::config::Config;
use crate::shell::{ExportLine, Shell};

pub trait ActiveVersionDetector {
    fn active_version(&self, install_root: &Path) -> Option<String>;
}

/// Maps a toolchain root to a version if it is a direct child of `install_root`.
///
/// Both paths are compared in canonical form, since `go env GOROOT` reports a
/// resolved path while the install root may sit behind a symlink.
pub fn version_from_root(install_root: &Path, root: &Path) -> Option<String> {
    let (install_root, root) = (canonical(install_root), canonical(root));
    let relative = root.strip_prefix(&install_root).ok()?;
    let mut components = relative.components();
    let version = match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => name.to_str()?.to_string(),
        _ => return None,
    };
    install_root.join(&version).is_dir().then_some(version)
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Asks the `go` binary found on `PATH` for its `GOROOT`.
#[derive(Debug, Clone)]
pub struct GoEnvDetector {
    program: PathBuf,
}

impl Default for GoEnvDetector {
    fn default() -> Self {
        Self { program: PathBuf::from("go") }
    }
}

impl GoEnvDetector {
    pub fn with_program<P: Into<PathBuf>>(program: P) -> Self {
        Self { program: program.into() }
    }
}

impl ActiveVersionDetector for GoEnvDetector {
    fn active_version(&self, install_root: &Path) -> Option<String> {
        let output = match Command::new(&self.program).args(["env", "GOROOT"]).output() {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                debug!(status = %output.status, "`go env GOROOT` failed");
                return None;
            }
            Err(e) => {
                debug!(error = %e, program = %self.program.display(), "toolchain not reachable");
                return None;
            }
        };
        let stdout = String::from_utf8_lossy(&output.stdout);
        let root = stdout.trim();
        if root.is_empty() {
            return None;
        }
        version_from_root(install_root, Path::new(root))
    }
}

/// Reads the version from the PATH export persisted in the shell startup file.
#[derive(Debug, Clone)]
pub struct StartupFileDetector {
    startup_file: Option<PathBuf>,
    export: Option<ExportLine>,
}

impl StartupFileDetector {
    pub fn new(startup_file: Option<PathBuf>, export: Option<ExportLine>) -> Self {
        Self { startup_file, export }
    }

    pub fn from_config(config: &Config) -> Self {
        let startup_file = Shell::detect(config.shell.as_deref())
            .ok()
            .map(|shell| shell.startup_file(&config.home));
        Self::new(startup_file, ExportLine::from_config(config).ok())
    }
}

impl ActiveVersionDetector for StartupFileDetector {
    fn active_version(&self, install_root: &Path) -> Option<String> {
        let (path, export) = (self.startup_file.as_ref()?, self.export.as_ref()?);
        let content = std::fs::read_to_string(path).ok()?;
        let version = content.lines().rev().find_map(|line| export.version_in(line))?;
        version_from_root(install_root, &install_root.join(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_version_from_root() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("1.21.5/bin")).unwrap();

        assert_eq!(version_from_root(root, &root.join("1.21.5")), Some("1.21.5".to_string()));
        assert_eq!(version_from_root(root, &root.join("1.21.5/bin")), None);
        assert_eq!(version_from_root(root, &root.join("1.20.0")), None);
        assert_eq!(version_from_root(root, Path::new("/usr/local/go")), None);
        assert_eq!(version_from_root(root, root), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_version_from_root_through_symlinked_home() {
        let dir = tempdir().unwrap();
        let real_home = dir.path().join("real");
        std::fs::create_dir_all(real_home.join(".go/1.21.5")).unwrap();
        let linked_home = dir.path().join("linked");
        std::os::unix::fs::symlink(&real_home, &linked_home).unwrap();

        let install_root = linked_home.join(".go");
        let resolved = std::fs::canonicalize(real_home.join(".go/1.21.5")).unwrap();
        assert_eq!(version_from_root(&install_root, &resolved), Some("1.21.5".to_string()));
        assert_eq!(
            version_from_root(&real_home.join(".go"), &install_root.join("1.21.5")),
            Some("1.21.5".to_string())
        );
    }

    #[test]
    fn test_unreachable_toolchain_yields_none() {
        let dir = tempdir().unwrap();
        let detector = GoEnvDetector::with_program(dir.path().join("no-such-go"));
        assert_eq!(detector.active_version(dir.path()), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_go_env_detector_reads_goroot() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let root = dir.path().join(".go");
        std::fs::create_dir_all(root.join("1.22.1")).unwrap();
        let script = dir.path().join("fake-go");
        std::fs::write(&script, format!("#!/bin/sh\necho {}\n", root.join("1.22.1").display())).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let detector = GoEnvDetector::with_program(&script);
        assert_eq!(detector.active_version(&root), Some("1.22.1".to_string()));
    }

    #[test]
    fn test_startup_file_detector_uses_last_export() {
        let dir = tempdir().unwrap();
        let home = dir.path();
        let root = home.join(".go");
        std::fs::create_dir_all(root.join("1.21.5")).unwrap();
        std::fs::write(
            home.join(".bashrc"),
            "export PATH=$HOME/.go/1.19/bin:$PATH\nexport PATH=$HOME/.go/1.21.5/bin:$PATH\n",
        )
        .unwrap();

        let mut config = Config::for_home(home);
        config.shell = Some("/bin/bash".to_string());
        let detector = StartupFileDetector::from_config(&config);
        assert_eq!(detector.active_version(&root), Some("1.21.5".to_string()));
    }

    #[test]
    fn test_startup_file_detector_ignores_removed_versions() {
        let dir = tempdir().unwrap();
        let home = dir.path();
        std::fs::write(home.join(".zshrc"), "export PATH=$HOME/.go/1.18/bin:$PATH\n").unwrap();

        let mut config = Config::for_home(home);
        config.shell = Some("zsh".to_string());
        let detector = StartupFileDetector::from_config(&config);
        assert_eq!(detector.active_version(&home.join(".go")), None);
    }
}
