use std::collections::HashSet;
use serde::Deserialize;
use tracing::debug;
use crate::error::{GoenvError, Result};
use crate::manager::Goenv;

/// Prefix carried by every version token in the feed (`go1.21.5`).
pub const VERSION_PREFIX: &str = "go";

/// A release as listed in the Go download feed.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RemoteRelease {
    /// Raw version token, e.g. `go1.21.5`.
    pub version: String,
    #[serde(default)]
    pub stable: bool,
    /// Downloadable files of this release, one per platform and kind.
    #[serde(default)]
    pub files: Vec<RemoteFile>,
}

/// Metadata for one downloadable file of a release.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RemoteFile {
    pub filename: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub arch: String,
    /// Hex encoded SHA-256 of the file.
    #[serde(default)]
    pub sha256: String,
    #[serde(default)]
    pub kind: String,
}

impl RemoteRelease {
    /// The version with the feed prefix stripped.
    pub fn version(&self) -> &str {
        strip_version_prefix(&self.version)
    }

    pub fn checksum_for(&self, filename: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|file| file.filename == filename && !file.sha256.is_empty())
            .map(|file| file.sha256.as_str())
    }
}

/// Strips the `go` prefix from a version token if present.
pub fn strip_version_prefix(token: &str) -> &str {
    token.strip_prefix(VERSION_PREFIX).unwrap_or(token)
}

/// Parses the JSON body of the download feed.
pub fn parse_catalog(body: &str) -> Result<Vec<RemoteRelease>> {
    serde_json::from_str(body).map_err(|e| GoenvError::decode("version catalog", e))
}

/// Versions of `releases` in feed order, each listed once.
pub fn catalog_versions(releases: &[RemoteRelease]) -> Vec<String> {
    let mut seen = HashSet::new();
    releases
        .iter()
        .map(RemoteRelease::version)
        .filter(|version| seen.insert(*version))
        .map(str::to_string)
        .collect()
}

impl Goenv {
    /// Fetches every release record from the download feed.
    ///
    /// A single request is made; there is no retry.
    pub fn fetch_catalog(&self) -> Result<Vec<RemoteRelease>> {
        let url = &self.config().feed_url;
        debug!(%url, "fetching version catalog");
        let response = self
            .http_client()?
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| GoenvError::network(url, e))?;
        let body = response.text().map_err(|e| GoenvError::network(url, e))?;
        let releases = parse_catalog(&body)?;
        debug!(count = releases.len(), "catalog fetched");
        Ok(releases)
    }

    /// Lists the publishable versions, newest first.
    pub fn list_remote(&self) -> Result<Vec<String>> {
        Ok(catalog_versions(&self.fetch_catalog()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_feed() {
        let releases = parse_catalog(r#"[{"version":"go1.21.5"},{"version":"go1.20.3"}]"#).unwrap();
        assert_eq!(catalog_versions(&releases), vec!["1.21.5", "1.20.3"]);
    }

    #[test]
    fn test_parse_full_feed_entry() {
        let body = r#"[{
            "version": "go1.21.5",
            "stable": true,
            "files": [
                {"filename": "go1.21.5.src.tar.gz", "os": "", "arch": "", "version": "go1.21.5",
                 "sha256": "aaaa", "size": 1, "kind": "source"},
                {"filename": "go1.21.5.linux-amd64.tar.gz", "os": "linux", "arch": "amd64",
                 "version": "go1.21.5", "sha256": "bbbb", "size": 2, "kind": "archive"}
            ]
        }]"#;
        let releases = parse_catalog(body).unwrap();
        assert!(releases[0].stable);
        assert_eq!(releases[0].checksum_for("go1.21.5.linux-amd64.tar.gz"), Some("bbbb"));
        assert_eq!(releases[0].checksum_for("go1.21.5.darwin-arm64.tar.gz"), None);
    }

    #[test]
    fn test_duplicate_versions_keep_first_position() {
        let releases = parse_catalog(
            r#"[{"version":"go1.22.0"},{"version":"go1.21.5"},{"version":"go1.22.0"}]"#,
        )
        .unwrap();
        assert_eq!(catalog_versions(&releases), vec!["1.22.0", "1.21.5"]);
    }

    #[test]
    fn test_token_without_prefix_is_kept() {
        assert_eq!(strip_version_prefix("1.21.5"), "1.21.5");
        assert_eq!(strip_version_prefix("go1.21rc2"), "1.21rc2");
    }

    #[test]
    fn test_malformed_feed_is_a_decode_error() {
        assert!(matches!(parse_catalog("<html>"), Err(GoenvError::Decode { .. })));
        assert!(matches!(parse_catalog(r#"{"version":"go1"}"#), Err(GoenvError::Decode { .. })));
        assert!(matches!(parse_catalog(r#"[{"name":"go1"}]"#), Err(GoenvError::Decode { .. })));
    }
}
