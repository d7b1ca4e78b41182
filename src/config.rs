use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::Deserialize;
use tracing::debug;
use crate::error::{GoenvError, Result};
use crate::global::utils::{get_global_cache_dir, get_global_config_file, get_home_dir};
use crate::util::Platform;

pub const DEFAULT_FEED_URL: &str = "https://go.dev/dl/?mode=json&include=all";
pub const DEFAULT_DOWNLOAD_BASE: &str = "https://dl.google.com/go";
/// Name of the install root directory inside the home directory.
pub const DEFAULT_ROOT_NAME: &str = ".go";

/// How the currently active version is discovered.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DetectorKind {
    /// Ask the `go` binary on `PATH` for its `GOROOT`.
    #[default]
    GoEnv,
    /// Read the PATH export persisted in the shell startup file.
    StartupFile,
}

/// Represents the contents of the optional `config.toml` file.
///
/// Every key is optional; missing keys keep their built-in default.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Directory holding one subdirectory per installed version.
    pub install_root: Option<PathBuf>,
    /// Keep downloaded archives for later reinstalls.
    pub cache_archives: Option<bool>,
    /// Compare downloads against the checksums published in the catalog.
    pub verify_checksum: Option<bool>,
    pub detector: Option<DetectorKind>,
    pub feed_url: Option<String>,
    pub download_base: Option<String>,
    /// Overall timeout for each HTTP request. No timeout when unset.
    pub http_timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Loads a `ConfigFile` from a file path.
    ///
    /// # Errors
    /// Returns an error if the file can't be read or deserialized.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ConfigFile> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| {
            GoenvError::Config(format!("{}: {}", path.as_ref().display(), e))
        })
    }
}

/// Fully resolved runtime configuration of the engine.
#[derive(Debug, Clone)]
pub struct Config {
    pub home: PathBuf,
    pub install_root: PathBuf,
    /// `None` disables the archive cache.
    pub cache_dir: Option<PathBuf>,
    /// Raw `SHELL`-like value, e.g. `/bin/zsh`.
    pub shell: Option<String>,
    pub platform: Platform,
    pub feed_url: String,
    pub download_base: String,
    pub verify_checksum: bool,
    pub detector: DetectorKind,
    pub http_timeout: Option<Duration>,
}

impl Config {
    /// Built-in defaults rooted at `home`, without cache or shell.
    pub fn for_home<P: AsRef<Path>>(home: P) -> Config {
        let home = home.as_ref().to_path_buf();
        Config {
            install_root: home.join(DEFAULT_ROOT_NAME),
            home,
            cache_dir: None,
            shell: None,
            platform: Platform::host(),
            feed_url: DEFAULT_FEED_URL.to_string(),
            download_base: DEFAULT_DOWNLOAD_BASE.to_string(),
            verify_checksum: true,
            detector: DetectorKind::default(),
            http_timeout: None,
        }
    }

    /// Resolves the configuration of the current user: defaults, then the
    /// config file if present, then `GOENV_ROOT` and `SHELL`.
    pub fn load() -> Result<Config> {
        let mut config = Config::for_home(get_home_dir()?);
        config.cache_dir = Some(get_global_cache_dir()?);

        let config_file = get_global_config_file()?;
        if config_file.is_file() {
            debug!(path = %config_file.display(), "loading config file");
            config.merge(ConfigFile::load(&config_file)?);
        }

        if let Some(root) = std::env::var_os("GOENV_ROOT").filter(|v| !v.is_empty()) {
            config.install_root = PathBuf::from(root);
        }
        config.shell = std::env::var("SHELL").ok().filter(|s| !s.is_empty());
        Ok(config)
    }

    /// Applies the keys set in `file` on top of this configuration.
    pub fn merge(&mut self, file: ConfigFile) {
        if let Some(root) = file.install_root {
            self.install_root = if root.is_relative() { self.home.join(root) } else { root };
        }
        if file.cache_archives == Some(false) {
            self.cache_dir = None;
        }
        if let Some(verify) = file.verify_checksum {
            self.verify_checksum = verify;
        }
        if let Some(detector) = file.detector {
            self.detector = detector;
        }
        if let Some(url) = file.feed_url {
            self.feed_url = url;
        }
        if let Some(base) = file.download_base {
            self.download_base = base.trim_end_matches('/').to_string();
        }
        if let Some(secs) = file.http_timeout_secs {
            self.http_timeout = Some(Duration::from_secs(secs));
        }
    }

    /// Installation directory of `version`.
    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.install_root.join(version)
    }

    /// Download URL of the distribution archive of `version` for this platform.
    pub fn archive_url(&self, version: &str) -> String {
        format!("{}/{}", self.download_base, self.platform.archive_file_name(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_for_home() {
        let config = Config::for_home("/home/gopher");
        assert_eq!(config.install_root, PathBuf::from("/home/gopher/.go"));
        assert_eq!(config.version_dir("1.21.5"), PathBuf::from("/home/gopher/.go/1.21.5"));
        assert!(config.cache_dir.is_none());
        assert_eq!(config.detector, DetectorKind::GoEnv);
    }

    #[test]
    fn test_archive_url() {
        let mut config = Config::for_home("/home/gopher");
        config.platform = Platform::new("linux", "amd64");
        assert_eq!(
            config.archive_url("1.21.5"),
            "https://dl.google.com/go/go1.21.5.linux-amd64.tar.gz"
        );
    }

    #[test]
    fn test_load_and_merge_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "install_root = \"sdk/go\"\n\
             cache_archives = false\n\
             detector = \"startup-file\"\n\
             download_base = \"https://mirror.example/go/\"\n\
             http_timeout_secs = 60\n",
        )
        .unwrap();

        let mut config = Config::for_home(dir.path());
        config.cache_dir = Some(dir.path().join("cache"));
        config.merge(ConfigFile::load(&path).unwrap());

        assert_eq!(config.install_root, dir.path().join("sdk/go"));
        assert!(config.cache_dir.is_none());
        assert_eq!(config.detector, DetectorKind::StartupFile);
        assert_eq!(config.download_base, "https://mirror.example/go");
        assert_eq!(config.http_timeout, Some(Duration::from_secs(60)));
        assert!(config.verify_checksum);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "install_rot = \"typo\"\n").unwrap();
        assert!(matches!(ConfigFile::load(&path), Err(GoenvError::Config(_))));
    }
}
