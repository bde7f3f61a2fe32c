//! Timestamp formatting utilities
//!
//! The `DateTimeFormat` setting of a [`LoggerSetup`](crate::config::LoggerSetup)
//! is either one of the named formats below or a strftime pattern. A pattern
//! without any `%` is read as a .NET custom date format (`yyyy-MM-dd HH:mm:ss.fff`)
//! and translated to strftime.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Local ISO 8601 with milliseconds and offset: `2025-01-08T10:30:45.123+02:00`
pub const DEFAULT_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// Timestamp format used when rendering log lines
///
/// # Examples
///
/// ```
/// use multiprocess_logger::core::TimestampFormat;
///
/// let format: TimestampFormat = "unix_millis".parse().unwrap();
/// assert_eq!(format, TimestampFormat::UnixMillis);
///
/// let format: TimestampFormat = "%d/%b/%Y:%H:%M:%S %z".parse().unwrap();
/// assert!(matches!(format, TimestampFormat::Custom(_)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds and UTC offset
    #[default]
    Iso8601,

    /// ISO 8601 with microseconds and UTC offset
    Iso8601Micros,

    /// RFC 3339 with offset
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Unix timestamp in microseconds: `1736332245123456`
    UnixMicros,

    /// Validated strftime pattern
    Custom(String),
}

impl TimestampFormat {
    /// Format a datetime in any timezone according to this format
    #[must_use]
    pub fn format<Tz>(&self, datetime: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        match self {
            TimestampFormat::Iso8601 => datetime.format(DEFAULT_DATE_TIME_FORMAT).to_string(),
            TimestampFormat::Iso8601Micros => {
                datetime.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()
            }
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::UnixMicros => datetime.timestamp_micros().to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixMicros
        )
    }

    fn name(&self) -> &str {
        match self {
            TimestampFormat::Iso8601 => "iso8601",
            TimestampFormat::Iso8601Micros => "iso8601_micros",
            TimestampFormat::Rfc3339 => "rfc3339",
            TimestampFormat::Unix => "unix",
            TimestampFormat::UnixMillis => "unix_millis",
            TimestampFormat::UnixMicros => "unix_micros",
            TimestampFormat::Custom(pattern) => pattern,
        }
    }
}

impl FromStr for TimestampFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let named = match trimmed.to_ascii_lowercase().as_str() {
            "" | "iso8601" => Some(TimestampFormat::Iso8601),
            "iso8601_micros" => Some(TimestampFormat::Iso8601Micros),
            "rfc3339" => Some(TimestampFormat::Rfc3339),
            "unix" => Some(TimestampFormat::Unix),
            "unix_millis" => Some(TimestampFormat::UnixMillis),
            "unix_micros" => Some(TimestampFormat::UnixMicros),
            _ => None,
        };
        if let Some(format) = named {
            return Ok(format);
        }

        let pattern = if trimmed.contains('%') {
            trimmed.to_string()
        } else {
            dotnet_to_strftime(trimmed)
                .ok_or_else(|| format!("Invalid date time format: '{}'", trimmed))?
        };

        // chrono panics while rendering an invalid pattern, so reject it here
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(format!("Invalid date time format: '{}'", trimmed));
        }
        Ok(TimestampFormat::Custom(pattern))
    }
}

/// Translate a .NET custom date and time pattern into strftime
///
/// Quoted text and `\`-escaped characters stay literal. Fractions are widened
/// to 3, 6 or 9 digits, the widths chrono renders. Returns `None` when the
/// pattern holds no date or time field at all.
fn dotnet_to_strftime(pattern: &str) -> Option<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut fields = 0;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&q| q == c)
                    .map_or(chars.len(), |offset| i + 1 + offset);
                out.extend(&chars[i + 1..end]);
                i = end + 1;
                continue;
            }
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                }
                i += 2;
                continue;
            }
            _ => {}
        }

        let run = chars[i..].iter().take_while(|&&r| r == c).count();
        let field = match (c, run) {
            ('y', 1..=2) => "%y",
            ('y', _) => "%Y",
            ('M', 1) => "%-m",
            ('M', 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', 1) => "%-d",
            ('d', 2) => "%d",
            ('d', 3) => "%a",
            ('d', _) => "%A",
            ('H', 1) => "%-H",
            ('H', _) => "%H",
            ('h', 1) => "%-I",
            ('h', _) => "%I",
            ('m', 1) => "%-M",
            ('m', _) => "%M",
            ('s', 1) => "%-S",
            ('s', _) => "%S",
            ('f' | 'F', 1..=3) => "%3f",
            ('f' | 'F', 4..=6) => "%6f",
            ('f' | 'F', _) => "%9f",
            ('t', _) => "%p",
            ('z' | 'K', _) => "%:z",
            _ => {
                out.extend(&chars[i..i + run]);
                i += run;
                continue;
            }
        };
        out.push_str(field);
        fields += 1;
        i += run;
    }

    (fields > 0).then_some(out)
}

impl TryFrom<String> for TimestampFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimestampFormat> for String {
    fn from(format: TimestampFormat) -> Self {
        format.name().to_string()
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
