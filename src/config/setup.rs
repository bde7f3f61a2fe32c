//! Logger setup and log config value objects

use crate::core::{diagnostics, LogLevel, TimestampFormat};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Default size limit before a file rolls (10 MiB)
pub const DEFAULT_ROLLING_FILE_SIZE_LIMIT: u64 = 10 * 1024 * 1024;

/// Default number of backups kept
pub const DEFAULT_ROLLING_FILE_COUNT_LIMIT: i32 = 10;

/// What makes the live file roll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingTrigger {
    /// New calendar day since the last write, or the size limit if one is set
    Date,
    /// Size limit only
    Size,
}

/// How many backups survive a roll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// One backup slot, overwritten on every roll
    SingleBackup,
    /// Backups accumulate forever
    Unlimited,
    /// At most `n` backups, oldest evicted first
    Bounded(u32),
}

impl Retention {
    pub fn from_count_limit(limit: i32) -> Self {
        match limit {
            0 => Retention::SingleBackup,
            n if n < 0 => Retention::Unlimited,
            n => Retention::Bounded(n.unsigned_abs()),
        }
    }
}

/// Logger settings
///
/// Immutable once loaded. A reload produces a new value that replaces the
/// old one wholesale.
///
/// Element names in XML and JSON documents are the PascalCase field names
/// (`Level`, `WriteToConsole`, `RollingFileSizeLimit`, ...). Missing elements
/// take their default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LoggerSetup {
    /// Lines below this level are dropped
    pub level: LogLevel,
    pub write_to_console: bool,
    pub write_to_file: bool,
    pub rolling_by_date: bool,
    /// Bytes; 0 disables size-based rolling
    pub rolling_file_size_limit: u64,
    /// 0 keeps one backup, negative keeps all, positive bounds the count
    pub rolling_file_count_limit: i32,
    /// An unusable pattern falls back to ISO 8601 on its own
    #[serde(deserialize_with = "lenient_date_time_format")]
    pub date_time_format: TimestampFormat,
    pub use_bracket: bool,
    pub enable_stack_info: bool,
}

impl Default for LoggerSetup {
    fn default() -> Self {
        Self {
            level: LogLevel::Trace,
            write_to_console: true,
            write_to_file: true,
            rolling_by_date: false,
            rolling_file_size_limit: DEFAULT_ROLLING_FILE_SIZE_LIMIT,
            rolling_file_count_limit: DEFAULT_ROLLING_FILE_COUNT_LIMIT,
            date_time_format: TimestampFormat::default(),
            use_bracket: true,
            enable_stack_info: false,
        }
    }
}

impl LoggerSetup {
    /// Whether a line at `level` produces any output at all
    #[inline]
    pub fn accepts(&self, level: LogLevel) -> bool {
        level >= self.level && (self.write_to_console || self.write_to_file)
    }

    pub fn rolling_trigger(&self) -> RollingTrigger {
        if self.rolling_by_date {
            RollingTrigger::Date
        } else {
            RollingTrigger::Size
        }
    }

    pub fn size_limit(&self) -> Option<u64> {
        (self.rolling_file_size_limit > 0).then_some(self.rolling_file_size_limit)
    }

    pub fn retention(&self) -> Retention {
        Retention::from_count_limit(self.rolling_file_count_limit)
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_outputs(mut self, console: bool, file: bool) -> Self {
        self.write_to_console = console;
        self.write_to_file = file;
        self
    }

    /// Size-based rolling with the given limit and count
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_size_rolling(mut self, size_limit: u64, count_limit: i32) -> Self {
        self.rolling_by_date = false;
        self.rolling_file_size_limit = size_limit;
        self.rolling_file_count_limit = count_limit;
        self
    }

    /// Date-based rolling; `size_limit` of 0 rolls on date change only
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_date_rolling(mut self, size_limit: u64, count_limit: i32) -> Self {
        self.rolling_by_date = true;
        self.rolling_file_size_limit = size_limit;
        self.rolling_file_count_limit = count_limit;
        self
    }
}

/// A target log file paired with its setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub log_file: PathBuf,
    pub logger_setup: LoggerSetup,
}

impl LogConfig {
    pub fn new(log_file: impl Into<PathBuf>, logger_setup: LoggerSetup) -> Self {
        Self {
            log_file: log_file.into(),
            logger_setup,
        }
    }

    /// `<executable stem>.log` in the current directory
    pub fn default_log_file() -> PathBuf {
        let stem = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "app".to_string());
        PathBuf::from(format!("{}.log", stem))
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new(Self::default_log_file(), LoggerSetup::default())
    }
}

fn lenient_date_time_format<'de, D>(deserializer: D) -> std::result::Result<TimestampFormat, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.parse().unwrap_or_else(|message: String| {
        diagnostics::warn(format!("{}; using {}", message, TimestampFormat::Iso8601));
        TimestampFormat::Iso8601
    }))
}
