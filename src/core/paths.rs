// src/core/paths.rs

use crate::constants::{APP_DIR_NAME, CACHE_DIR_ENV, STYLES_CONFIG_FILENAME};
use crate::core::uid;
use lazy_static::lazy_static;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

lazy_static! {
    static ref QUIVER_CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

/// Errors locating quiver's directories.
#[derive(Error, Debug)]
pub enum PathError {
    /// The platform has no config directory.
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    /// The platform has no cache directory.
    #[error("Could not find system cache directory.")]
    CacheDirNotFound,
    /// `~` was used but no home directory is known.
    #[error("Could not find the home directory.")]
    HomeDirNotFound,
    /// A directory could not be created.
    #[error("Could not create directory at '{path}': {source}")]
    DirCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Returns the path to the quiver configuration directory (`~/.config/quiver`).
/// Creates it if it doesn't exist.
///
/// Memoized: only the first call touches the filesystem.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    // A poisoned lock only means another thread panicked mid-lookup; the cached
    // value is still either None or a complete path.
    let mut cached = QUIVER_CONFIG_DIR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(APP_DIR_NAME);

    if !config_path.exists() {
        fs::create_dir_all(&config_path).map_err(|e| PathError::DirCreation {
            path: config_path.display().to_string(),
            source: e,
        })?;
    }

    *cached = Some(config_path.clone());
    Ok(config_path)
}

/// Returns the path to `styles.toml` inside the config directory.
///
/// Unlike [`get_config_dir`] this never creates anything: reading styles
/// happens on every completion and must not leave directories behind.
pub fn get_styles_config_path() -> Result<PathBuf, PathError> {
    Ok(dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(APP_DIR_NAME)
        .join(STYLES_CONFIG_FILENAME))
}

/// Determines the root of the completion cache for the running executable.
///
/// `QUIVER_CACHE_DIR` wins when set; otherwise
/// `<system cache dir>/quiver/<executable>`. Not memoized, so tests and hosts
/// can redirect it at runtime. The directory is not created here.
pub fn get_cache_root() -> Result<PathBuf, PathError> {
    if let Ok(dir) = env::var(CACHE_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return expand_home(&dir);
    }
    Ok(dirs::cache_dir()
        .ok_or(PathError::CacheDirNotFound)?
        .join(APP_DIR_NAME)
        .join(uid::executable()))
}

/// Replaces a leading `~` with the user's home directory.
///
/// Only the tilde is expanded; `$VARS` in completion input are left alone so
/// that a literal `$` in a directory name is not rewritten.
pub fn expand_home(path: &str) -> Result<PathBuf, PathError> {
    if path.starts_with('~') && dirs::home_dir().is_none() {
        return Err(PathError::HomeDirNotFound);
    }
    let expanded = shellexpand::tilde(path);
    Ok(PathBuf::from(expanded.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home_replaces_leading_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home("~").unwrap(), home);
        assert_eq!(expand_home("~/projects").unwrap(), home.join("projects"));
    }

    #[test]
    fn test_expand_home_leaves_other_paths() {
        assert_eq!(expand_home("/tmp/x").unwrap(), PathBuf::from("/tmp/x"));
        assert_eq!(expand_home("a/~b").unwrap(), PathBuf::from("a/~b"));
        assert_eq!(expand_home("$HOME/x").unwrap(), PathBuf::from("$HOME/x"));
    }
}
