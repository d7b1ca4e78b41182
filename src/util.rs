use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use sha2::{Digest, Sha256};

/// The host platform in Go's naming (`GOOS`/`GOARCH`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: &str, arch: &str) -> Self {
        Self { os: os.to_string(), arch: arch.to_string() }
    }

    /// Returns the platform of the running host, translated from Rust's
    /// `std::env::consts` identifiers into the ones used by Go downloads.
    pub fn host() -> Self {
        Self {
            os: go_os(std::env::consts::OS).to_string(),
            arch: go_arch(std::env::consts::ARCH).to_string(),
        }
    }

    pub fn archive_format(&self) -> ArchiveFormat {
        match self.os.as_str() {
            "windows" => ArchiveFormat::Zip,
            _ => ArchiveFormat::TarGz,
        }
    }

    /// File name of the distribution archive, e.g. `go1.21.5.linux-amd64.tar.gz`.
    pub fn archive_file_name(&self, version: &str) -> String {
        format!(
            "go{}.{}-{}.{}",
            version,
            self.os,
            self.arch,
            self.archive_format().extension()
        )
    }
}

fn go_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn go_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "arm" => "armv6l",
        "powerpc64" => "ppc64le",
        "loongarch64" => "loong64",
        other => other,
    }
}

/// Container format of a distribution archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Zip => "zip",
        }
    }
}

/// Wraps a reader and reports the running byte count after every read.
pub struct ProgressReader<R, F> {
    inner: R,
    read: u64,
    on_progress: F,
}

impl<R: Read, F: FnMut(u64)> ProgressReader<R, F> {
    pub fn new(inner: R, on_progress: F) -> Self {
        Self { inner, read: 0, on_progress }
    }
}

impl<R: Read, F: FnMut(u64)> Read for ProgressReader<R, F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.read += n as u64;
        (self.on_progress)(self.read);
        Ok(n)
    }
}

/// Computes the hex encoded SHA-256 of a file.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Dot-prefixed names are staging or bookkeeping entries, never versions.
pub fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
