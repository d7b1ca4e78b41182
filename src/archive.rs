//! Extraction of distribution archives.
//!
//! Go archives wrap their payload in a single top-level `go/` directory. That
//! component is stripped from every entry so an installation directory directly
//! contains `bin/`, `src/`, `VERSION` and friends.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{Read, Seek, Write};
use std::path::{Component, Path, PathBuf};
use flate2::read::GzDecoder;
use tracing::{debug, warn};
use crate::error::{GoenvError, Result};
use crate::util::ArchiveFormat;

/// What an extraction wrote.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub directories: usize,
    pub files: usize,
    /// Entries that are neither directories nor regular files (links, devices...).
    pub skipped: usize,
}

/// Strips the shared top-level component from archive entry paths.
///
/// The component is taken from the first entry seen and every later entry must
/// start with it.
#[derive(Debug, Default)]
struct PathNormalizer {
    top: Option<OsString>,
}

impl PathNormalizer {
    /// Returns the path relative to the top-level directory, or `None` for the
    /// top-level directory itself.
    fn normalize(&mut self, raw: &Path) -> Result<Option<PathBuf>> {
        let mut parts = Vec::new();
        for component in raw.components() {
            match component {
                Component::Normal(part) => parts.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(GoenvError::decode(
                        "archive",
                        format!("entry `{}` escapes the destination", raw.display()),
                    ));
                }
            }
        }
        let Some((first, rest)) = parts.split_first() else {
            return Ok(None);
        };
        match &self.top {
            None => self.top = Some(first.to_os_string()),
            Some(top) if top.as_os_str() == *first => {}
            Some(top) => {
                return Err(GoenvError::decode(
                    "archive",
                    format!(
                        "entry `{}` is outside the top-level directory `{}`",
                        raw.display(),
                        top.to_string_lossy()
                    ),
                ));
            }
        }
        if rest.is_empty() {
            return Ok(None);
        }
        Ok(Some(rest.iter().collect()))
    }
}

/// Extracts the archive at `archive` into `dest`.
pub fn extract_archive(archive: &Path, format: ArchiveFormat, dest: &Path) -> Result<ExtractSummary> {
    let file = File::open(archive)?;
    match format {
        ArchiveFormat::TarGz => extract_tar_gz(file, dest),
        ArchiveFormat::Zip => extract_zip(file, dest),
    }
}

/// Extracts a gzip compressed tar stream into `dest`.
pub fn extract_tar_gz<R: Read>(reader: R, dest: &Path) -> Result<ExtractSummary> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let mut normalizer = PathNormalizer::default();
    let mut summary = ExtractSummary::default();
    fs::create_dir_all(dest)?;

    let entries = archive.entries().map_err(|e| GoenvError::decode("archive", e))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| GoenvError::decode("archive", e))?;
        let kind = entry.header().entry_type();
        if !kind.is_dir() && !kind.is_file() {
            // pax/GNU metadata entries are consumed by the iterator; what reaches
            // here is a link, fifo or device.
            let raw = entry.path().map(|p| p.display().to_string()).unwrap_or_default();
            warn!(entry = %raw, kind = ?kind, "skipping unsupported archive entry");
            summary.skipped += 1;
            continue;
        }
        let raw = entry.path().map_err(|e| GoenvError::decode("archive", e))?.into_owned();
        let mode = entry.header().mode().ok();
        let Some(relative) = normalizer.normalize(&raw)? else {
            if kind.is_file() {
                return Err(top_level_file(&raw));
            }
            continue;
        };
        let target = dest.join(&relative);
        if kind.is_dir() {
            create_dir(&target, mode)?;
            summary.directories += 1;
        } else {
            write_file(&mut entry, &target, mode)?;
            summary.files += 1;
        }
    }
    debug!(?summary, dest = %dest.display(), "tar archive extracted");
    Ok(summary)
}

/// Extracts a zip archive into `dest`.
pub fn extract_zip<R: Read + Seek>(reader: R, dest: &Path) -> Result<ExtractSummary> {
    let mut archive = zip::ZipArchive::new(reader).map_err(|e| GoenvError::decode("archive", e))?;
    let mut normalizer = PathNormalizer::default();
    let mut summary = ExtractSummary::default();
    fs::create_dir_all(dest)?;

    for index in 0..archive.len() {
        let mut file = archive.by_index(index).map_err(|e| GoenvError::decode("archive", e))?;
        let raw = file.enclosed_name().ok_or_else(|| {
            GoenvError::decode("archive", format!("entry `{}` escapes the destination", file.name()))
        })?;
        if !file.is_dir() && !file.is_file() {
            warn!(entry = %raw.display(), "skipping unsupported archive entry");
            summary.skipped += 1;
            continue;
        }
        let mode = file.unix_mode();
        let Some(relative) = normalizer.normalize(&raw)? else {
            if file.is_file() {
                return Err(top_level_file(&raw));
            }
            continue;
        };
        let target = dest.join(&relative);
        if file.is_dir() {
            create_dir(&target, mode)?;
            summary.directories += 1;
        } else {
            write_file(&mut file, &target, mode)?;
            summary.files += 1;
        }
    }
    debug!(?summary, dest = %dest.display(), "zip archive extracted");
    Ok(summary)
}

fn top_level_file(raw: &Path) -> GoenvError {
    GoenvError::decode(
        "archive",
        format!("file `{}` is not inside a top-level directory", raw.display()),
    )
}

fn create_dir(path: &Path, mode: Option<u32>) -> Result<()> {
    fs::create_dir_all(path)?;
    // Directories stay writable by the owner so their children can be created.
    set_mode(path, mode.map(|m| m | 0o700))
}

fn write_file<R: Read>(reader: &mut R, path: &Path, mode: Option<u32>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = File::create(path)?;
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf).map_err(|e| GoenvError::decode("archive", e))?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
    }
    out.flush()?;
    set_mode(path, mode)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: Option<u32>) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::tempdir;

    fn tar_gz(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
        for (path, content) in entries {
            let mut header = tar::Header::new_gnu();
            match content {
                Some(data) => {
                    header.set_entry_type(tar::EntryType::Regular);
                    header.set_size(data.len() as u64);
                    header.set_mode(0o755);
                    builder.append_data(&mut header, path, *data).unwrap();
                }
                None => {
                    header.set_entry_type(tar::EntryType::Directory);
                    header.set_size(0);
                    header.set_mode(0o755);
                    builder.append_data(&mut header, path, std::io::empty()).unwrap();
                }
            }
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_normalizer_strips_first_component() {
        let mut normalizer = PathNormalizer::default();
        assert_eq!(normalizer.normalize(Path::new("go/")).unwrap(), None);
        assert_eq!(
            normalizer.normalize(Path::new("go/bin/go")).unwrap(),
            Some(PathBuf::from("bin/go"))
        );
        assert_eq!(
            normalizer.normalize(Path::new("./go/VERSION")).unwrap(),
            Some(PathBuf::from("VERSION"))
        );
    }

    #[test]
    fn test_normalizer_rejects_foreign_top_level() {
        let mut normalizer = PathNormalizer::default();
        normalizer.normalize(Path::new("go/bin/go")).unwrap();
        assert!(normalizer.normalize(Path::new("other/file")).is_err());
    }

    #[test]
    fn test_normalizer_rejects_traversal() {
        let mut normalizer = PathNormalizer::default();
        assert!(normalizer.normalize(Path::new("go/../../etc/passwd")).is_err());
        assert!(normalizer.normalize(Path::new("/etc/passwd")).is_err());
    }

    #[test]
    fn test_extract_strips_top_level_directory() {
        let data = tar_gz(&[
            ("go/bin/go", Some(b"#!/bin/sh\necho go\n")),
            ("go/VERSION", Some(b"go1.21.5\n")),
        ]);
        let dir = tempdir().unwrap();
        let dest = dir.path().join("1.21.5");

        let summary = extract_tar_gz(&data[..], &dest).unwrap();

        assert_eq!(summary.files, 2);
        assert!(dest.join("bin/go").is_file());
        assert_eq!(std::fs::read(dest.join("VERSION")).unwrap(), b"go1.21.5\n");
        assert!(!dest.join("go").exists());
    }

    #[test]
    fn test_extract_creates_directories() {
        let data = tar_gz(&[
            ("go/", None),
            ("go/pkg/", None),
            ("go/pkg/tool/", None),
            ("go/src/fmt/print.go", Some(b"package fmt\n")),
        ]);
        let dir = tempdir().unwrap();

        let summary = extract_tar_gz(&data[..], dir.path()).unwrap();

        assert_eq!(summary.directories, 2);
        assert!(dir.path().join("pkg/tool").is_dir());
        assert!(dir.path().join("src/fmt/print.go").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_keeps_permission_bits() {
        use std::os::unix::fs::PermissionsExt;
        let data = tar_gz(&[("go/bin/gofmt", Some(b"bin"))]);
        let dir = tempdir().unwrap();
        extract_tar_gz(&data[..], dir.path()).unwrap();
        let mode = std::fs::metadata(dir.path().join("bin/gofmt")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_extract_rejects_corrupt_stream() {
        let dir = tempdir().unwrap();
        let garbage = b"definitely not gzip".to_vec();
        assert!(matches!(
            extract_tar_gz(&garbage[..], dir.path()),
            Err(GoenvError::Decode { .. })
        ));
    }

    #[test]
    fn test_extract_rejects_file_at_top_level() {
        let data = tar_gz(&[("README", Some(b"hi"))]);
        let dir = tempdir().unwrap();
        assert!(matches!(
            extract_tar_gz(&data[..], dir.path()),
            Err(GoenvError::Decode { .. })
        ));
    }

    #[test]
    fn test_extract_zip_strips_top_level_directory() {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            writer.add_directory("go/", options).unwrap();
            writer.start_file("go/bin/go.exe", options).unwrap();
            writer.write_all(b"MZ").unwrap();
            writer.start_file("go/VERSION", options).unwrap();
            writer.write_all(b"go1.21.5").unwrap();
            writer.finish().unwrap();
        }
        buf.set_position(0);
        let dir = tempdir().unwrap();

        let summary = extract_zip(buf, dir.path()).unwrap();

        assert_eq!(summary.files, 2);
        assert!(dir.path().join("bin/go.exe").is_file());
        assert!(dir.path().join("VERSION").is_file());
    }
}
