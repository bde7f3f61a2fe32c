//! File appender that is safe to share between processes
//!
//! Every write takes the [`ProcessLock`] derived from the file's path, applies
//! the rolling policy and appends the whole batch, so any number of processes
//! can log to one file without interleaving partial batches.

use super::process_lock::ProcessLock;
use super::rolling::{FileState, RollingPolicy};
use crate::config::{get_file_full_path, LoggerSetup};
use crate::core::{diagnostics, LoggerError, LoggerMetrics, Result};
use chrono::Local;
use parking_lot::RwLock;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const COMPONENT: &str = "MultiProcessFileAppender";

/// Appends batches of rendered lines to one log file under a cross-process lock
///
/// Write failures are best-effort: they are reported through diagnostics and
/// counted in [`LoggerMetrics::write_failures`] but never returned.
///
/// # Examples
///
/// ```no_run
/// use multiprocess_logger::appenders::MultiProcessFileAppender;
/// use multiprocess_logger::config::LoggerSetup;
/// use std::sync::Arc;
///
/// let setup = Arc::new(LoggerSetup::default().with_size_rolling(1024 * 1024, 5));
/// let appender = MultiProcessFileAppender::new("logs/app.log", setup).unwrap();
/// appender.write(&["first line\n".to_string()]).unwrap();
/// ```
pub struct MultiProcessFileAppender {
    path: PathBuf,
    setup: Arc<LoggerSetup>,
    policy: RollingPolicy,
    lock: RwLock<Option<ProcessLock>>,
    disposed: AtomicBool,
    metrics: Arc<LoggerMetrics>,
}

impl MultiProcessFileAppender {
    /// Create an appender for `path`
    ///
    /// # Errors
    ///
    /// Returns error if the path cannot be resolved, its directory cannot be
    /// created, or the process lock cannot be opened.
    pub fn new(path: impl AsRef<Path>, setup: Arc<LoggerSetup>) -> Result<Self> {
        Self::with_metrics(path, setup, Arc::new(LoggerMetrics::new()))
    }

    /// Create an appender that records into shared metrics
    ///
    /// # Errors
    ///
    /// Same as [`MultiProcessFileAppender::new`].
    pub fn with_metrics(
        path: impl AsRef<Path>,
        setup: Arc<LoggerSetup>,
        metrics: Arc<LoggerMetrics>,
    ) -> Result<Self> {
        Self::open(path.as_ref(), setup, Arc::clone(&metrics)).inspect_err(|e| {
            diagnostics::report_with(&metrics, "creating file appender", e);
        })
    }

    fn open(path: &Path, setup: Arc<LoggerSetup>, metrics: Arc<LoggerMetrics>) -> Result<Self> {
        let path = get_file_full_path(&path.to_string_lossy())?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let lock = ProcessLock::open(&path)?;
        let policy = RollingPolicy::from_setup(&setup);

        Ok(Self {
            path,
            setup,
            policy,
            lock: RwLock::new(Some(lock)),
            disposed: AtomicBool::new(false),
            metrics,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn setup(&self) -> &Arc<LoggerSetup> {
        &self.setup
    }

    pub fn policy(&self) -> &RollingPolicy {
        &self.policy
    }

    pub fn metrics(&self) -> &Arc<LoggerMetrics> {
        &self.metrics
    }

    /// Name of the cross-process lock guarding this file
    ///
    /// # Errors
    ///
    /// `Disposed` after [`dispose`](Self::dispose).
    pub fn mutex_name(&self) -> Result<String> {
        match &*self.lock.read() {
            Some(lock) => Ok(lock.name().to_string()),
            None => Err(LoggerError::disposed(COMPONENT)),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Append `lines` as one contiguous write
    ///
    /// Blocks until the cross-process lock is free. I/O and lock failures are
    /// reported and swallowed.
    ///
    /// # Errors
    ///
    /// Only `Disposed`, after [`dispose`](Self::dispose).
    pub fn write(&self, lines: &[String]) -> Result<()> {
        let slot = self.lock.read();
        let lock = match &*slot {
            Some(lock) if !self.is_disposed() => lock,
            _ => return Err(LoggerError::disposed(COMPONENT)),
        };
        if lines.is_empty() {
            return Ok(());
        }

        let buffer = lines.concat();
        let _guard = match lock.acquire() {
            Ok(guard) => guard,
            Err(e) => {
                self.metrics.record_write_failure();
                diagnostics::report_with(&self.metrics, "acquiring log file lock", &e);
                return Ok(());
            }
        };

        if let Err(e) = self.append_locked(buffer.as_bytes()) {
            self.metrics.record_write_failure();
            diagnostics::report_with(&self.metrics, "writing log file", &e);
        }
        Ok(())
    }

    /// Apply the rolling policy as if `pending` bytes were about to be written
    ///
    /// Returns whether the file rolled.
    ///
    /// # Errors
    ///
    /// `Disposed` after [`dispose`](Self::dispose), or the lock/open failure.
    pub fn roll_if_needed(&self, pending: u64) -> Result<bool> {
        let slot = self.lock.read();
        let lock = match &*slot {
            Some(lock) if !self.is_disposed() => lock,
            _ => return Err(LoggerError::disposed(COMPONENT)),
        };
        let _guard = lock.acquire()?;
        let mut file = self.open_live_file()?;
        Ok(self.process_rolling_file(&mut file, pending))
    }

    fn append_locked(&self, bytes: &[u8]) -> Result<()> {
        let mut file = self.open_live_file()?;
        self.process_rolling_file(&mut file, bytes.len() as u64);

        file.seek(SeekFrom::End(0))?;
        file.write_all(bytes).map_err(|e| {
            LoggerError::io_operation(
                "writing log file",
                format!("Failed to append to '{}'", self.path.display()),
                e,
            )
        })?;
        file.flush()?;
        Ok(())
    }

    fn open_live_file(&self) -> Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| {
                LoggerError::io_operation(
                    "opening log file",
                    format!("Failed to open '{}'", self.path.display()),
                    e,
                )
            })
    }

    /// Roll the live file if the policy says so
    ///
    /// The caller must hold the process lock. Returns whether the file rolled.
    ///
    /// A failed roll leaves the live file untouched so the write that follows
    /// simply appends.
    pub fn process_rolling_file(&self, file: &mut File, pending: u64) -> bool {
        let state = match file.metadata() {
            Ok(metadata) => FileState::of(&metadata),
            Err(e) => {
                let err = LoggerError::from(e);
                diagnostics::report_with(&self.metrics, "reading log file metadata", &err);
                return false;
            }
        };

        if !self
            .policy
            .should_roll(&state, pending, Local::now().date_naive())
        {
            return false;
        }

        let outcome = match self.policy.roll(&self.path, state.last_write) {
            Ok(outcome) => outcome,
            Err(e) => {
                let err = LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to copy live file to backup: {}", e),
                );
                diagnostics::report_with(&self.metrics, "rolling log file", &err);
                return false;
            }
        };

        if outcome.failed_shifts > 0 {
            diagnostics::warn(format!(
                "{} backup(s) of '{}' could not be shifted; backup series may have gaps",
                outcome.failed_shifts,
                self.path.display()
            ));
        }

        if let Err(e) = file.set_len(0) {
            let err = LoggerError::file_rotation(
                self.path.display().to_string(),
                format!("Failed to truncate after backup to '{}': {}", outcome.backup.display(), e),
            );
            diagnostics::report_with(&self.metrics, "rolling log file", &err);
            return false;
        }

        self.metrics.record_rotation();
        true
    }

    /// Release the process lock; later writes fail with `Disposed`
    ///
    /// Idempotent. Waits for a write in progress to finish.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.lock.write().take();
    }
}

impl Drop for MultiProcessFileAppender {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::process_lock::mutex_name;
    use crate::appenders::rolling::sequence_path;
    use tempfile::tempdir;

    fn size_setup(limit: u64, count: i32) -> Arc<LoggerSetup> {
        Arc::new(LoggerSetup::default().with_size_rolling(limit, count))
    }

    fn line(len: usize) -> String {
        let mut s = "x".repeat(len - 1);
        s.push('\n');
        s
    }

    #[test]
    fn test_appender_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("app.log");
        let appender = MultiProcessFileAppender::new(&path, size_setup(0, 0)).unwrap();

        appender.write(&["hello\n".to_string()]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
        assert_eq!(appender.path(), path.as_path());
    }

    #[test]
    fn test_batch_is_written_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("batch.log");
        let appender = MultiProcessFileAppender::new(&path, size_setup(0, 0)).unwrap();

        let lines: Vec<String> = (0..5).map(|i| format!("line {}\n", i)).collect();
        appender.write(&lines).unwrap();
        appender.write(&[]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), lines.concat());
        assert_eq!(appender.metrics().write_failures(), 0);
    }

    #[test]
    fn test_rolling_scenario_size_100_count_2() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scenario.log");
        let appender = MultiProcessFileAppender::new(&path, size_setup(100, 2)).unwrap();

        let batch = vec![line(60)];
        appender.write(&batch).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 60);
        assert!(!sequence_path(&path, 1).exists());

        appender.write(&batch).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 60);
        assert_eq!(fs::metadata(sequence_path(&path, 1)).unwrap().len(), 60);

        appender.write(&batch).unwrap();
        assert!(sequence_path(&path, 2).exists());
        assert!(!sequence_path(&path, 3).exists());
        assert_eq!(appender.metrics().rotations(), 2);

        let files = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("scenario.log"))
            .count();
        assert_eq!(files, 3);
    }

    #[test]
    fn test_roll_check_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("idempotent.log");
        let appender = MultiProcessFileAppender::new(&path, size_setup(100, -1)).unwrap();

        appender.write(&[line(80)]).unwrap();
        assert!(appender.roll_if_needed(30).unwrap());
        assert!(!appender.roll_if_needed(30).unwrap());
        assert_eq!(appender.metrics().rotations(), 1);
        assert!(!sequence_path(&path, 2).exists());
    }

    #[test]
    fn test_oversized_batch_into_empty_file_does_not_roll() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.log");
        let appender = MultiProcessFileAppender::new(&path, size_setup(10, 1)).unwrap();

        appender.write(&[line(50)]).unwrap();
        assert_eq!(appender.metrics().rotations(), 0);
        assert_eq!(fs::metadata(&path).unwrap().len(), 50);
    }

    #[test]
    fn test_preexisting_gap_evicts_oldest_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gap.log");
        fs::write(sequence_path(&path, 2), "OLDEST\n").unwrap();
        let appender = MultiProcessFileAppender::new(&path, size_setup(10, 2)).unwrap();

        for fill in ["AAAAAAAA\n", "BBBBBBBB\n", "CCCCCCCC\n"] {
            appender.write(&[fill.to_string()]).unwrap();
        }

        assert_eq!(fs::read_to_string(sequence_path(&path, 1)).unwrap(), "AAAAAAAA\n");
        assert_eq!(fs::read_to_string(sequence_path(&path, 2)).unwrap(), "BBBBBBBB\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "CCCCCCCC\n");
    }

    #[test]
    fn test_lock_file_lives_beside_log_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locked.log");
        let first = MultiProcessFileAppender::new(&path, size_setup(0, 0)).unwrap();
        let second = MultiProcessFileAppender::new(&path, size_setup(0, 0)).unwrap();

        let sentinel = |appender: &MultiProcessFileAppender| {
            appender
                .lock
                .read()
                .as_ref()
                .map(|lock| lock.sentinel().to_path_buf())
                .unwrap()
        };
        assert_eq!(sentinel(&first), sentinel(&second));
        assert_eq!(sentinel(&first).parent(), Some(dir.path()));
        assert!(sentinel(&first).exists());
    }

    #[test]
    fn test_mutex_name_matches_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("named.log");
        let appender = MultiProcessFileAppender::new(&path, size_setup(0, 0)).unwrap();
        assert_eq!(appender.mutex_name().unwrap(), mutex_name(appender.path()));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("disposed.log");
        let appender = MultiProcessFileAppender::new(&path, size_setup(0, 0)).unwrap();

        appender.dispose();
        appender.dispose();
        assert!(appender.is_disposed());

        let err = appender.write(&["late\n".to_string()]).unwrap_err();
        assert!(matches!(err, LoggerError::Disposed { .. }));
        assert!(matches!(
            appender.mutex_name().unwrap_err(),
            LoggerError::Disposed { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_in_place_of_file_is_swallowed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("actually_a_dir");
        let appender = MultiProcessFileAppender::new(&path, size_setup(0, 0)).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(appender.write(&["lost\n".to_string()]).is_ok());
        assert_eq!(appender.metrics().write_failures(), 1);
    }
}
