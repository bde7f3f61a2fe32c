//! Log entry structure

use super::log_level::LogLevel;
use crate::config::LoggerSetup;
use chrono::{DateTime, Local};
use std::cell::RefCell;
use std::panic::Location;

// Thread-local cache for the thread label to avoid repeated allocations
thread_local! {
    static THREAD_LABEL_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Thread name if set, otherwise the debug form of its id
fn get_thread_label() -> String {
    THREAD_LABEL_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| {
                let current = std::thread::current();
                current
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("{:?}", current.id()))
            })
            .clone()
    })
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Local>,
    pub thread: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl LogEntry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// so one call always produces one physical line.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: &str) -> Self {
        Self {
            level,
            message: Self::sanitize_message(message),
            timestamp: Local::now(),
            thread: get_thread_label(),
            file: None,
            line: None,
        }
    }

    pub fn with_location(mut self, location: &Location<'_>) -> Self {
        self.file = Some(location.file().to_string());
        self.line = Some(location.line());
        self
    }

    /// Render the entry as one newline-terminated line
    ///
    /// With `UseBracket` every prefix field is wrapped in `[...]`, otherwise the
    /// fields are separated by single spaces. The `file:line` field is only
    /// present when `EnableStackInfo` is set and a location was captured.
    pub fn render(&self, setup: &LoggerSetup) -> String {
        let timestamp = setup.date_time_format.format(&self.timestamp);
        let location = match (&self.file, self.line) {
            (Some(file), Some(line)) if setup.enable_stack_info => Some(format!("{}:{}", file, line)),
            _ => None,
        };

        let mut fields = vec![timestamp, format!("{:5}", self.level), self.thread.clone()];
        fields.extend(location);

        let mut output = String::with_capacity(self.message.len() + 64);
        for field in &fields {
            if setup.use_bracket {
                output.push('[');
                output.push_str(field);
                output.push_str("] ");
            } else {
                output.push_str(field);
                output.push(' ');
            }
        }
        output.push_str(&self.message);
        output.push('\n');
        output
    }
}
