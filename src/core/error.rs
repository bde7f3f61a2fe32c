//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

/// Coarse classification used to decide how an error propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or malformed configuration; recoverable with defaults.
    Configuration,
    /// The cross-process lock could not be created or acquired.
    Synchronization,
    /// Write or rotation failure; swallowed at the appender boundary.
    Io,
    /// The component was already disposed or stopped.
    Disposed,
    Other,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Config file does not exist
    #[error("Configuration file not found: '{path}'")]
    ConfigNotFound { path: String },

    /// Config file exists but could not be deserialized
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParse { path: String, message: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Lock sentinel could not be created or opened
    #[error("Failed to create process lock '{name}': {source}")]
    LockCreation {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Lock could not be acquired
    #[error("Failed to acquire process lock '{name}': {source}")]
    LockAcquire {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// XML deserialization error
    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::DeError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Config watcher error
    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),

    /// Component used after dispose
    #[error("{component} has already been disposed")]
    Disposed { component: String },

    /// Logger already stopped
    #[error("Logger already stopped")]
    LoggerStopped,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        LoggerError::ConfigNotFound { path: path.into() }
    }

    pub fn config_parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::ConfigParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn lock_creation(name: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::LockCreation {
            name: name.into(),
            source,
        }
    }

    pub fn lock_acquire(name: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::LockAcquire {
            name: name.into(),
            source,
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn disposed(component: impl Into<String>) -> Self {
        LoggerError::Disposed {
            component: component.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            LoggerError::ConfigNotFound { .. }
            | LoggerError::ConfigParse { .. }
            | LoggerError::InvalidConfiguration { .. }
            | LoggerError::XmlError(_)
            | LoggerError::JsonError(_)
            | LoggerError::WatchError(_) => ErrorCategory::Configuration,
            LoggerError::LockCreation { .. } | LoggerError::LockAcquire { .. } => {
                ErrorCategory::Synchronization
            }
            LoggerError::IoOperation { .. }
            | LoggerError::IoError(_)
            | LoggerError::FileRotationError { .. } => ErrorCategory::Io,
            LoggerError::Disposed { .. } | LoggerError::LoggerStopped => ErrorCategory::Disposed,
            LoggerError::Other(_) => ErrorCategory::Other,
        }
    }

    /// Errors of this kind are reported internally and never reach the caller
    /// of a logging call.
    pub fn is_best_effort(&self) -> bool {
        self.category() == ErrorCategory::Io
    }
}
