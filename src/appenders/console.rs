//! Console output
//!
//! Runs on the logging thread, not the writer thread, so console lines appear
//! in call order even while file output is still queued.

use crate::core::{LogEntry, LogLevel};
#[cfg(feature = "console")]
use colored::Colorize;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy)]
pub struct ConsoleAppender {
    use_colors: bool,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Write an already rendered line
    ///
    /// `Error` and `Fatal` go to stderr, everything else to stdout. A broken
    /// pipe or closed console is ignored.
    pub fn write(&self, entry: &LogEntry, line: &str) {
        let output = self.decorate(entry.level, line);
        let _ = match entry.level {
            LogLevel::Error | LogLevel::Fatal => io::stderr().lock().write_all(output.as_bytes()),
            _ => io::stdout().lock().write_all(output.as_bytes()),
        };
    }

    pub fn flush(&self) {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
    }

    #[cfg(feature = "console")]
    fn decorate(&self, level: LogLevel, line: &str) -> String {
        if !self.use_colors {
            return line.to_string();
        }
        // Color the text but keep the newline outside the escape sequence
        let body = line.strip_suffix('\n').unwrap_or(line);
        format!("{}\n", body.color(level.color_code()))
    }

    #[cfg(not(feature = "console"))]
    fn decorate(&self, _level: LogLevel, line: &str) -> String {
        line.to_string()
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_output_is_unchanged() {
        let console = ConsoleAppender::with_colors(false);
        assert_eq!(console.decorate(LogLevel::Info, "line\n"), "line\n");
    }

    #[cfg(feature = "console")]
    #[test]
    fn test_colored_output_keeps_newline_last() {
        colored::control::set_override(true);
        let console = ConsoleAppender::new();
        let output = console.decorate(LogLevel::Error, "boom\n");
        assert!(output.contains("boom"));
        assert!(output.ends_with("\n"));
        assert!(!output.ends_with("boom\n"));
    }
}
