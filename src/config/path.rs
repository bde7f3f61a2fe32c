//! Log file path resolution
//!
//! Configured paths may contain whole segments naming an environment
//! variable, written `%NAME%` or `$NAME$`:
//!
//! ```text
//! %LOCALAPPDATA%\MyApp\app.log
//! $HOME$/logs/app.log
//! ```

use crate::core::{LoggerError, Result};
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

/// Expand environment segments and resolve `name` to an absolute path
///
/// A segment (text between path separators) that starts with `%` or `$` is
/// replaced by the value of the variable named by the segment with its
/// delimiters trimmed; unset variables expand to the empty string. The result
/// is made absolute against the current directory and normalized lexically
/// (`.` dropped, `..` applied) without touching the filesystem.
///
/// # Errors
///
/// Returns `InvalidConfiguration` for an empty or whitespace-only name.
pub fn get_file_full_path(name: &str) -> Result<PathBuf> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LoggerError::config("log file path", "path is empty"));
    }

    let expanded = expand_env_segments(trimmed);
    let absolute = std::path::absolute(&expanded).map_err(|e| {
        LoggerError::io_operation(
            "resolving log file path",
            format!("cannot make '{}' absolute", expanded),
            e,
        )
    })?;
    Ok(normalize_lexically(&absolute))
}

/// Replace `%NAME%` / `$NAME$` segments with environment values
pub fn expand_env_segments(path: &str) -> String {
    path.split(std::path::is_separator)
        .map(|segment| {
            if segment.starts_with('%') || segment.starts_with('$') {
                let var = segment.trim_matches(|c| c == '%' || c == '$');
                std::env::var(var).unwrap_or_default()
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(&MAIN_SEPARATOR.to_string())
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(
                    normalized.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
