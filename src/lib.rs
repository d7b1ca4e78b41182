//! # goenv Core Library
//!
//! This crate contains the version lifecycle engine of the `goenv` tool: it installs,
//! lists, switches between and removes Go toolchain versions in a per-user install
//! root (`~/.go/<version>/`), and lists the versions published on go.dev.
//!
//! This library is built for the `goenv` CLI, but the [`Goenv`] engine can be embedded
//! in other tools as well.
//!
//! ## Modules Overview
//! - [`catalog`] – Fetching and parsing the remote list of releases
//! - [`archive`] – Extracting distribution archives with their `go/` prefix stripped
//! - [`installer`] – Download, staged install and uninstall of versions
//! - [`versions`] – Enumerating installed versions
//! - [`active`] – Strategies for detecting the active version
//! - [`shell`] – Switching versions: process environment and shell startup files
//! - [`config`] – Runtime configuration and the optional `config.toml`
//! - [`util`] – Platform identifiers, progress reporting, hashing
//! - [`global`] – Per-user directories and the archive cache

pub mod active;
pub mod archive;
pub mod catalog;
pub mod config;
pub mod error;
pub mod global;
pub mod installer;
pub mod manager;
pub mod shell;
pub mod util;
pub mod versions;

pub use active::*;
pub use catalog::*;
pub use config::*;
pub use error::*;
pub use installer::*;
pub use manager::*;
pub use shell::*;
pub use util::*;
pub use versions::*;
