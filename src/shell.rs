use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use regex::Regex;
use tracing::{debug, info, warn};
use crate::config::Config;
use crate::error::{GoenvError, Result};
use crate::manager::Goenv;

/// Environment variable holding the root of the active toolchain.
pub const ROOT_VAR: &str = "GOROOT";

/// Shell dialects whose startup file can be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
}

impl Shell {
    /// Picks the dialect from a `SHELL`-like value such as `/usr/bin/zsh`.
    ///
    /// # Errors
    /// Returns [`GoenvError::UnsupportedShell`] for anything but bash and zsh.
    pub fn detect(value: Option<&str>) -> Result<Shell> {
        let value = value.unwrap_or_default();
        let name = value.rsplit(['/', '\\']).next().unwrap_or_default().trim();
        match name {
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            _ => Err(GoenvError::UnsupportedShell(value.to_string())),
        }
    }

    pub fn startup_file_name(&self) -> &'static str {
        match self {
            Shell::Bash => ".bashrc",
            Shell::Zsh => ".zshrc",
        }
    }

    pub fn startup_file(&self, home: &Path) -> PathBuf {
        home.join(self.startup_file_name())
    }
}

/// The `export PATH=...` line persisted in a startup file.
///
/// The install root is written as `$HOME/<relative>` when it lives below the
/// home directory, so the line stays valid if the home directory moves. Roots
/// with characters the shell would split or expand are double quoted.
#[derive(Debug, Clone)]
pub struct ExportLine {
    root_expr: String,
    quoted: bool,
    pattern: Regex,
}

impl ExportLine {
    pub fn new(install_root: &Path, home: &Path) -> Result<Self> {
        let (prefix, literal) = match install_root.strip_prefix(home) {
            Ok(relative) if !relative.as_os_str().is_empty() => {
                let parts: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                ("$HOME/", parts.join("/"))
            }
            _ => ("", install_root.display().to_string()),
        };
        let quoted = literal
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || "/._-+@%:,=".contains(c)));
        let root_expr = match quoted {
            true => format!("{prefix}{}", escape_double_quoted(&literal)),
            false => format!("{prefix}{literal}"),
        };
        let pattern = Regex::new(&format!(
            r#"^\s*export\s+PATH="?{}/([^/"]+)/bin"#,
            regex::escape(&root_expr)
        ))
        .map_err(|e| GoenvError::Config(format!("Invalid export pattern: {e}")))?;
        Ok(Self { root_expr, quoted, pattern })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.install_root, &config.home)
    }

    pub fn render(&self, version: &str) -> String {
        match self.quoted {
            true => format!("export PATH=\"{}/{}/bin:$PATH\"", self.root_expr, version),
            false => format!("export PATH={}/{}/bin:$PATH", self.root_expr, version),
        }
    }

    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    /// The version named by `line`, if it is an export line.
    pub fn version_in<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Drops every export line from `contents` and appends the one for `version`.
///
/// Other lines keep their content and order; trailing blank lines are dropped
/// so the export always ends the file. A file using CRLF line endings keeps
/// them.
pub fn rewrite_startup_file(contents: &str, export: &ExportLine, version: &str) -> String {
    let newline = if contents.contains("\r\n") { "\r\n" } else { "\n" };
    let new_line = export.render(version);
    let mut lines: Vec<&str> = contents.lines().filter(|line| !export.matches(line)).collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    lines.push(&new_line);
    let mut out = lines.join(newline);
    out.push_str(newline);
    out
}

/// Reads, rewrites and stores a startup file. A missing file is created.
pub fn update_startup_file(path: &Path, export: &ExportLine, version: &str) -> Result<()> {
    let current = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    let updated = rewrite_startup_file(&current, export, version);
    if updated != current {
        std::fs::write(path, updated)?;
        debug!(path = %path.display(), %version, "startup file updated");
    }
    Ok(())
}

fn escape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Process environment for running `version`, computed without touching the
/// real environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvChanges {
    pub goroot: PathBuf,
    pub path: OsString,
}

impl EnvChanges {
    /// Prepends the `bin` directory of `version` to `current_path`, dropping
    /// entries that point into the install root.
    pub fn for_version(config: &Config, version: &str, current_path: Option<OsString>) -> Result<Self> {
        let goroot = config.version_dir(version);
        let mut entries = vec![goroot.join("bin")];
        if let Some(current) = current_path {
            entries.extend(
                std::env::split_paths(&current).filter(|p| !p.starts_with(&config.install_root)),
            );
        }
        let path = std::env::join_paths(entries)
            .map_err(|e| GoenvError::Config(format!("Could not build PATH: {e}")))?;
        Ok(Self { goroot, path })
    }

    /// Writes the variables into the current process environment, visible to
    /// child processes spawned afterwards.
    ///
    /// # Safety
    /// Must not run while other threads read or write the environment.
    pub unsafe fn apply(&self) {
        unsafe {
            std::env::set_var(ROOT_VAR, &self.goroot);
            std::env::set_var("PATH", &self.path);
        }
    }
}

/// Where a switch was persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    StartupFile(PathBuf),
    /// The shell is not supported; only the process environment changed.
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchResult {
    AlreadyActive(String),
    Switched {
        version: String,
        env: EnvChanges,
        persistence: Persistence,
    },
}

impl Goenv {
    /// Makes `version` the active version.
    ///
    /// # Errors
    /// [`GoenvError::NotInstalled`] if there is no such installation, IO errors
    /// from the startup file.
    pub fn use_version(&self, version: &str) -> Result<SwitchResult> {
        if !self.is_installed(version) {
            return Err(GoenvError::NotInstalled(version.to_string()));
        }
        if self.active_version().as_deref() == Some(version) {
            return Ok(SwitchResult::AlreadyActive(version.to_string()));
        }
        self.activate(version)
    }

    pub(crate) fn activate(&self, version: &str) -> Result<SwitchResult> {
        let config = self.config();
        let env = EnvChanges::for_version(config, version, std::env::var_os("PATH"))?;
        let persistence = match Shell::detect(config.shell.as_deref()) {
            Ok(shell) => {
                let path = shell.startup_file(&config.home);
                update_startup_file(&path, &ExportLine::from_config(config)?, version)?;
                Persistence::StartupFile(path)
            }
            Err(e) => {
                warn!("{e}");
                Persistence::Unsupported(config.shell.clone().unwrap_or_default())
            }
        };
        info!(%version, "switched active version");
        Ok(SwitchResult::Switched { version: version.to_string(), env, persistence })
    }
}
