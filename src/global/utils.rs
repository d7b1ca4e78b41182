use std::path::PathBuf;
use directories::{BaseDirs, ProjectDirs};
use crate::error::{GoenvError, Result};

/// Name of the optional configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub fn get_home_dir() -> Result<PathBuf> {
    let base = BaseDirs::new()
        .ok_or_else(|| GoenvError::Config("Could not determine the home directory".to_string()))?;
    Ok(base.home_dir().to_path_buf())
}

pub fn get_global_config_file() -> Result<PathBuf> {
    let (config_dir, _) = get_global_dirs()?;
    Ok(config_dir.join(CONFIG_FILE_NAME))
}

pub fn get_global_cache_dir() -> Result<PathBuf> {
    let (_, cache_dir) = get_global_dirs()?;
    Ok(cache_dir)
}

pub fn get_global_dirs() -> Result<(PathBuf, PathBuf)> {
    let proj_dirs = ProjectDirs::from("org", "goenv", "goenv")
        .ok_or_else(|| GoenvError::Config("Could not get project directories".to_string()))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    let cache_dir = proj_dirs.cache_dir().to_path_buf();

    Ok((config_dir, cache_dir))
}
