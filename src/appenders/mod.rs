//! Output targets: console and the multi-process rolling file

pub mod console;
pub mod multi_process_file;
pub mod process_lock;
pub mod rolling;

pub use console::ConsoleAppender;
pub use multi_process_file::MultiProcessFileAppender;
pub use process_lock::{mutex_name, ProcessLock, ProcessLockGuard, LOCK_NAME_PREFIX};
pub use rolling::{FileState, RollOutcome, RollingPolicy, BACKUP_DATE_FORMAT};
