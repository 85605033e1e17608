//! File System Utilities
//!
//! Platform directory lookup for configuration and log files.

use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "service-runtime", "service-runtime")
}

/// Get the application's configuration directory without creating it
///
/// Platform-specific locations:
/// - **Linux**: `~/.config/service-runtime/` or `$XDG_CONFIG_HOME/service-runtime/`
/// - **macOS**: `~/Library/Application Support/com.service-runtime.service-runtime/`
/// - **Windows**: `C:\Users\<User>\AppData\Roaming\service-runtime\service-runtime\config\`
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get or create the data directory used for log files
///
/// Platform-specific locations:
/// - **Linux**: `~/.local/share/service-runtime/`
/// - **macOS**: `~/Library/Application Support/com.service-runtime.service-runtime/`
/// - **Windows**: `C:\Users\<User>\AppData\Roaming\service-runtime\service-runtime\data\`
pub fn get_or_create_data_dir() -> Result<PathBuf> {
    let Some(project_dirs) = project_dirs() else {
        return Err(Error::Invalid {
            message: "Could not determine project directories".to_string(),
        });
    };

    let data_dir = project_dirs.data_dir();

    if !data_dir.exists() {
        fs::create_dir_all(data_dir)?;
    }

    Ok(data_dir.to_path_buf())
}

/// Resolve a possibly relative log file path against the data directory
pub fn resolve_log_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(get_or_create_data_dir()?.join(path))
}
