use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;
use crate::error::{GoenvError, Result};

fn archive_name(url: &str) -> Result<&str> {
    url.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| GoenvError::Config(format!("Could not determine archive name from {url}")))
}

/// Where the archive downloaded from `url` is kept inside `cache_dir`.
pub fn cached_archive_path(cache_dir: &Path, url: &str) -> Result<PathBuf> {
    Ok(cache_dir.join(archive_name(url)?))
}

pub fn get_cached_archive(cache_dir: &Path, url: &str) -> Result<Option<PathBuf>> {
    let archive_path = cached_archive_path(cache_dir, url)?;
    if archive_path.is_file() {
        Ok(Some(archive_path))
    }
    else {
        Ok(None)
    }
}

pub fn ensure_cache_dir(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        std::fs::create_dir_all(cache_dir)?;
        debug!(path = %cache_dir.display(), "cache directory created");
    }
    Ok(())
}

/// Removes every cached archive of `version`, whatever its platform.
///
/// Returns the number of files removed.
pub fn remove_cached_archives(cache_dir: &Path, version: &str) -> Result<usize> {
    if !cache_dir.exists() {
        return Ok(0);
    }
    let prefix = format!("go{version}.");
    let mut removed = 0;
    for entry in WalkDir::new(cache_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| GoenvError::Io(e.into()))?;
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_file() && name.starts_with(&prefix) {
            std::fs::remove_file(entry.path())?;
            debug!(path = %entry.path().display(), "removed cached archive");
            removed += 1;
        }
    }
    Ok(removed)
}
