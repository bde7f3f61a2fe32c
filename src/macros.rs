//! Logging macros for ergonomic log message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`. The message is only
//! formatted when the logger's current setup accepts the level, and the call
//! site is recorded when stack info is enabled.
//!
//! Each macro evaluates to the `Result` of [`Logger::log_args`](crate::Logger::log_args).
//!
//! # Examples
//!
//! ```no_run
//! use multiprocess_logger::prelude::*;
//! use multiprocess_logger::info;
//!
//! let logger = Logger::new("logs/server.log", LoggerSetup::default());
//!
//! // Basic logging
//! info!(logger, "Server started").ok();
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port).ok();
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```no_run
/// # use multiprocess_logger::prelude::*;
/// # let logger = Logger::new("app.log", LoggerSetup::default());
/// use multiprocess_logger::log;
/// log!(logger, LogLevel::Info, "Simple message").ok();
/// log!(logger, LogLevel::Error, "Error code: {}", 500).ok();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_args($level, ::std::format_args!($($arg)+))
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```no_run
/// # use multiprocess_logger::prelude::*;
/// # let logger = Logger::new("app.log", LoggerSetup::default());
/// use multiprocess_logger::warn;
/// warn!(logger, "Retry attempt {} of {}", 3, 5).ok();
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
