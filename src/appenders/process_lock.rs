//! Cross-process exclusive lock keyed by a log file path
//!
//! Every process that writes a given log file derives the same lock name
//! from the file's lowercased full path, so writers in different processes
//! (and under different users) serialize on one OS-level lock. The lock is an
//! advisory `flock`/`LockFileEx` on a hidden sentinel file in the log file's
//! own directory, so its location does not depend on the environment of the
//! writing process.

use crate::core::{LoggerError, Result};
use fs2::FileExt;
use parking_lot::{Mutex, MutexGuard};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Prefix of every lock name
pub const LOCK_NAME_PREFIX: &str = "Global\\DevLibLogging_";

const SENTINEL_PREFIX: &str = ".DevLibLogging_";

/// Uppercase hex MD5 of the lowercased path
fn path_digest(full_path: &Path) -> String {
    let lowered = full_path.to_string_lossy().to_lowercase();
    format!("{:X}", md5::compute(lowered.as_bytes()))
}

/// Lock name for an already-resolved full path
///
/// A pure function of `full_path` lowercased: two paths that differ only in
/// case map to the same name.
pub fn mutex_name(full_path: &Path) -> String {
    format!("{}{}", LOCK_NAME_PREFIX, path_digest(full_path))
}

/// Sentinel file that backs the lock for `full_path`
///
/// Lives next to the log file. `TMPDIR`, `%TEMP%` and per-service private
/// temp directories differ between writers of the same file.
pub fn sentinel_path(full_path: &Path) -> PathBuf {
    let file_name = format!("{}{}.lock", SENTINEL_PREFIX, path_digest(full_path));
    match full_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(file_name),
        _ => PathBuf::from(file_name),
    }
}

/// Named lock shared by every process writing the same log file
///
/// `flock` locks belong to an open file description, so threads sharing one
/// `ProcessLock` would not exclude each other through it; the inner mutex
/// covers that case.
#[derive(Debug)]
pub struct ProcessLock {
    name: String,
    sentinel: PathBuf,
    file: Mutex<File>,
}

impl ProcessLock {
    /// Open or create the lock for `full_path`
    ///
    /// # Errors
    ///
    /// `LockCreation` when the sentinel file cannot be opened.
    pub fn open(full_path: &Path) -> Result<Self> {
        let name = mutex_name(full_path);
        let sentinel = sentinel_path(full_path);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&sentinel)
            .map_err(|e| LoggerError::lock_creation(&name, e))?;
        allow_all_users(&file);

        Ok(Self {
            name,
            sentinel,
            file: Mutex::new(file),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sentinel(&self) -> &Path {
        &self.sentinel
    }

    /// Block until this thread holds the lock across all processes
    ///
    /// There is no timeout. An interrupted wait is retried; a lock held by a
    /// process that died is released by the OS together with its handle.
    ///
    /// # Errors
    ///
    /// `LockAcquire` when the OS refuses the lock for another reason.
    pub fn acquire(&self) -> Result<ProcessLockGuard<'_>> {
        let file = self.file.lock();
        loop {
            match FileExt::lock_exclusive(&*file) {
                Ok(()) => return Ok(ProcessLockGuard { file }),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(LoggerError::lock_acquire(&self.name, e)),
            }
        }
    }
}

/// Holds the lock until dropped
pub struct ProcessLockGuard<'a> {
    file: MutexGuard<'a, File>,
}

impl Drop for ProcessLockGuard<'_> {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&*self.file);
    }
}

// Writers may run under different accounts, so anyone must be able to open
// the sentinel. Best-effort: the file may belong to another user already.
#[cfg(unix)]
fn allow_all_users(file: &File) {
    use std::os::unix::fs::PermissionsExt;
    let _ = file.set_permissions(std::fs::Permissions::from_mode(0o666));
}

#[cfg(not(unix))]
fn allow_all_users(_file: &File) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_name_is_case_insensitive() {
        let a = mutex_name(Path::new("/var/log/App.log"));
        let b = mutex_name(Path::new("/VAR/LOG/app.LOG"));
        assert_eq!(a, b);
        assert_ne!(a, mutex_name(Path::new("/var/log/other.log")));
    }

    #[test]
    fn test_name_format() {
        let name = mutex_name(Path::new("/var/log/app.log"));
        let digest = name.strip_prefix(LOCK_NAME_PREFIX).unwrap();
        assert_eq!(digest.len(), 32);
        assert!(digest.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_eq!(digest, format!("{:X}", md5::compute(b"/var/log/app.log")));
    }

    #[test]
    fn test_sentinel_beside_log_file() {
        let sentinel = sentinel_path(Path::new("/var/log/app.log"));
        assert_eq!(sentinel.parent(), Some(Path::new("/var/log")));

        let file_name = sentinel.file_name().unwrap().to_string_lossy().into_owned();
        let digest = mutex_name(Path::new("/var/log/app.log"))
            .strip_prefix(LOCK_NAME_PREFIX)
            .unwrap()
            .to_string();
        assert_eq!(file_name, format!(".DevLibLogging_{}.lock", digest));
        assert!(!sentinel.starts_with(std::env::temp_dir()));
    }

    #[test]
    fn test_two_locks_on_same_path_exclude_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("shared.log");
        let first = Arc::new(ProcessLock::open(&target).unwrap());
        let second = Arc::new(ProcessLock::open(&target).unwrap());
        assert_eq!(first.name(), second.name());

        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let lock = if i % 2 == 0 { Arc::clone(&first) } else { Arc::clone(&second) };
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    for _ in 0..20 {
                        let _guard = lock.acquire().unwrap();
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_micros(200));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }
}
