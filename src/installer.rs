use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use crate::archive::extract_archive;
use crate::error::{GoenvError, Result};
use crate::global::cache::{cached_archive_path, ensure_cache_dir, get_cached_archive, remove_cached_archives};
use crate::manager::Goenv;
use crate::shell::SwitchResult;
use crate::util::{sha256_file, ArchiveFormat, ProgressReader};
use crate::versions::{ensure_valid_version_name, InstallationRecord};

/// Outcome of a successful uninstall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallResult {
    pub version: String,
    /// The switch made to move away from the removed version, if it was active.
    pub switched: Option<SwitchResult>,
    /// Number of cached archives of the version that were deleted.
    pub removed_archives: usize,
}

impl Goenv {
    /// Downloads and installs `version` for the configured platform.
    ///
    /// `progress` receives the number of bytes downloaded so far and the total
    /// size when the server announces it.
    ///
    /// # Errors
    /// [`GoenvError::AlreadyInstalled`] when the version directory exists; network,
    /// decode, checksum and IO errors otherwise. Nothing is left in the install
    /// root when extraction fails.
    pub fn install<F: FnMut(u64, Option<u64>)>(
        &self,
        version: &str,
        mut progress: F,
    ) -> Result<InstallationRecord> {
        ensure_valid_version_name(version)?;
        if self.is_installed(version) {
            return Err(GoenvError::AlreadyInstalled(version.to_string()));
        }
        let config = self.config();
        let url = config.archive_url(version);
        let format = config.platform.archive_format();
        std::fs::create_dir_all(&config.install_root)?;

        // Without a cache the download lives in a hidden scratch directory of the
        // install root and disappears with it.
        let mut scratch = None;
        let (archive, cached) = match &config.cache_dir {
            Some(cache_dir) => {
                ensure_cache_dir(cache_dir)?;
                match get_cached_archive(cache_dir, &url)? {
                    Some(path) => {
                        info!(path = %path.display(), "using cached archive");
                        (path, true)
                    }
                    None => {
                        let path = cached_archive_path(cache_dir, &url)?;
                        self.download(&url, &path, &mut progress)?;
                        (path, true)
                    }
                }
            }
            None => {
                let dir = tempfile::Builder::new()
                    .prefix(".download-")
                    .tempdir_in(&config.install_root)?;
                let path = dir.path().join(config.platform.archive_file_name(version));
                scratch = Some(dir);
                self.download(&url, &path, &mut progress)?;
                (path, false)
            }
        };

        let result = self
            .verify_checksum(version, &archive)
            .and_then(|_| self.install_from_archive(version, &archive, format));
        if cached && matches!(result, Err(GoenvError::ChecksumMismatch { .. } | GoenvError::Decode { .. })) {
            if let Err(e) = std::fs::remove_file(&archive) {
                warn!(path = %archive.display(), error = %e, "could not discard bad cached archive");
            }
        }
        drop(scratch);
        result
    }

    /// Installs `version` from an archive already on disk.
    ///
    /// The archive is extracted into a hidden staging directory of the install
    /// root which is renamed to the version directory once complete.
    pub fn install_from_archive(
        &self,
        version: &str,
        archive: &Path,
        format: ArchiveFormat,
    ) -> Result<InstallationRecord> {
        ensure_valid_version_name(version)?;
        if self.is_installed(version) {
            return Err(GoenvError::AlreadyInstalled(version.to_string()));
        }
        let config = self.config();
        std::fs::create_dir_all(&config.install_root)?;
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&config.install_root)?;
        debug!(staging = %staging.path().display(), "extracting {}", archive.display());
        extract_archive(archive, format, staging.path())?;

        let dest = config.version_dir(version);
        std::fs::rename(staging.path(), &dest)?;
        info!(%version, path = %dest.display(), "installed");
        Ok(InstallationRecord {
            version: version.to_string(),
            is_active: self.active_version().as_deref() == Some(version),
            path: dest,
        })
    }

    fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<()> {
        info!(%url, "downloading");
        let response = self
            .http_client()?
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| GoenvError::network(url, e))?;
        let total = response.content_length();

        let part = part_path(dest);
        let mut file = File::create(&part)?;
        let mut reader = ProgressReader::new(response, |read| progress(read, total));
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buf).map_err(|e| GoenvError::network(url, e))?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])?;
        }
        file.flush()?;
        drop(file);
        std::fs::rename(&part, dest)?;
        debug!(path = %dest.display(), "download complete");
        Ok(())
    }

    /// Compares the archive against the checksum published in the catalog.
    ///
    /// Verification is skipped when the catalog cannot be fetched or has no
    /// entry for the archive.
    fn verify_checksum(&self, version: &str, archive: &Path) -> Result<()> {
        if !self.config().verify_checksum {
            return Ok(());
        }
        let file_name = self.config().platform.archive_file_name(version);
        let releases = match self.fetch_catalog() {
            Ok(releases) => releases,
            Err(e) => {
                warn!(error = %e, "catalog unavailable, skipping checksum verification");
                return Ok(());
            }
        };
        let expected = releases
            .iter()
            .filter(|release| release.version() == version)
            .find_map(|release| release.checksum_for(&file_name));
        let Some(expected) = expected else {
            warn!(file = %file_name, "no published checksum, skipping verification");
            return Ok(());
        };
        let actual = sha256_file(archive)?;
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(GoenvError::ChecksumMismatch {
                file: file_name,
                expected: expected.to_string(),
                actual,
            });
        }
        debug!(file = %file_name, "checksum verified");
        Ok(())
    }

    /// Removes an installed version.
    ///
    /// When `version` is active another installed version (the first one in
    /// listing order) is activated first.
    ///
    /// # Errors
    /// [`GoenvError::NotInstalled`], or [`GoenvError::NoAlternativeVersion`] when the
    /// active version is the only one installed. Nothing changes in either case.
    pub fn uninstall(&self, version: &str) -> Result<UninstallResult> {
        if !self.is_installed(version) {
            return Err(GoenvError::NotInstalled(version.to_string()));
        }
        let mut switched = None;
        if self.active_version().as_deref() == Some(version) {
            let other = self
                .list_installed()?
                .into_iter()
                .find(|record| record.version != version)
                .ok_or_else(|| GoenvError::NoAlternativeVersion(version.to_string()))?;
            info!(from = %version, to = %other.version, "moving off the active version");
            switched = Some(self.activate(&other.version)?);
        }

        let dir = self.config().version_dir(version);
        std::fs::remove_dir_all(&dir)?;
        info!(%version, path = %dir.display(), "uninstalled");

        let removed_archives = match &self.config().cache_dir {
            Some(cache_dir) => remove_cached_archives(cache_dir, version)?,
            None => 0,
        };
        Ok(UninstallResult { version: version.to_string(), switched, removed_archives })
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/cache/go1.21.5.linux-amd64.tar.gz")),
            PathBuf::from("/cache/go1.21.5.linux-amd64.tar.gz.part")
        );
    }
}
