//! # Multi-process Logger
//!
//! A file logger that any number of processes can share. Each process queues
//! rendered lines to a background writer thread, and the writer appends them
//! under a cross-process lock keyed by the log file's path, rolling the file
//! by size or date.
//!
//! ## Features
//!
//! - **Multi-process safe**: one OS-level lock per log file, shared by every writer
//! - **Rolling**: size or date triggers with single, bounded or unlimited backups
//! - **Hot reload**: XML or JSON config files are watched and reapplied on change
//! - **Non-blocking callers**: file output happens on a dedicated writer thread
//!
//! ## Example
//!
//! ```no_run
//! use multiprocess_logger::prelude::*;
//! use multiprocess_logger::info;
//!
//! let setup = LoggerSetup::default().with_size_rolling(1024 * 1024, 5);
//! let mut logger = Logger::new("logs/app.log", setup);
//!
//! info!(logger, "worker {} started", std::process::id()).ok();
//! logger.close(DEFAULT_SHUTDOWN_TIMEOUT);
//! ```

pub mod appenders;
pub mod config;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, MultiProcessFileAppender};
    pub use crate::config::{LogConfig, LoggerSetup, Retention, RollingTrigger};
    pub use crate::core::{
        LogEntry, LogLevel, Logger, LoggerBuilder, LoggerError, LoggerMetrics, Result,
        TimestampFormat, DEFAULT_SHUTDOWN_TIMEOUT,
    };
}

pub use appenders::{ConsoleAppender, MultiProcessFileAppender};
pub use config::{get_log_config, get_logger_setup, LogConfig, LoggerSetup};
pub use core::{
    ErrorCategory, LogEntry, LogLevel, Logger, LoggerBuilder, LoggerError, LoggerMetrics, Result,
    TimestampFormat, DEFAULT_SHUTDOWN_TIMEOUT,
};
