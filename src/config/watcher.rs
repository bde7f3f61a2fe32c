//! Config file watching for hot reload

use crate::core::{diagnostics, LoggerError, Result};
use notify::event::{AccessKind, AccessMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Sets a shared flag whenever the watched file is created, modified,
/// renamed or deleted
///
/// The parent directory is watched rather than the file itself so the watch
/// survives editors that replace the file, and so a file that does not exist
/// yet can be picked up once created. The flag is only ever set here; the
/// logger clears it with [`ConfigWatcher::take_changed`].
pub struct ConfigWatcher {
    path: PathBuf,
    changed: Arc<AtomicBool>,
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    /// Start watching `path`
    ///
    /// # Errors
    ///
    /// Fails when the path has no file name or its directory cannot be watched.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = std::path::absolute(path.as_ref())?;
        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| LoggerError::config("config watcher", "path has no file name"))?;
        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| LoggerError::config("config watcher", "path has no parent directory"))?;

        let changed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&changed);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let touches_file = event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(file_name.as_os_str()));
                if touches_file && is_change(&event.kind) {
                    flag.store(true, Ordering::Release);
                }
            }
            Err(e) => diagnostics::report("watching config file", &LoggerError::from(e)),
        })?;
        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        Ok(Self {
            path,
            changed,
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns and clears the changed flag
    ///
    /// Only one of several concurrent callers observes `true` for a given change.
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }

    /// Raise the flag as if the file had changed
    pub fn mark_changed(&self) {
        self.changed.store(true, Ordering::Release);
    }
}

// Reads of the config (ours included) must not count as changes
fn is_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => true,
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => true,
        _ => false,
    }
}
