//! Loading [`LoggerSetup`] and [`LogConfig`] from configuration files
//!
//! Files ending in `.json` are read as JSON; everything else is XML:
//!
//! ```xml
//! <LogConfig>
//!   <LogFile>$HOME$/logs/app.log</LogFile>
//!   <LoggerSetup>
//!     <Level>INFO</Level>
//!     <RollingFileSizeLimit>1048576</RollingFileSizeLimit>
//!     <RollingFileCountLimit>5</RollingFileCountLimit>
//!   </LoggerSetup>
//! </LogConfig>
//! ```
//!
//! A document whose root is a bare `<LoggerSetup>` is also accepted as a
//! log config; its log file is [`LogConfig::default_log_file`].
//!
//! With `throw_on_error = false` every failure falls back to defaults after
//! being reported through diagnostics.

use super::path::get_file_full_path;
use super::setup::{LogConfig, LoggerSetup};
use crate::core::{diagnostics, LoggerError, Result};
use quick_xml::events::Event;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

const SETUP_ELEMENT: &str = "LoggerSetup";
const LOG_FILE_ELEMENT: &str = "LogFile";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Xml,
    Json,
}

impl ConfigFormat {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Xml,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct LogConfigDocument {
    log_file: Option<String>,
    logger_setup: Option<LoggerSetup>,
}

/// Load a [`LoggerSetup`] from `path`
///
/// # Errors
///
/// Only when `throw_on_error` is set: `ConfigNotFound` for a missing file,
/// `ConfigParse` for a document that cannot be read or deserialized.
pub fn get_logger_setup(path: impl AsRef<Path>, throw_on_error: bool) -> Result<LoggerSetup> {
    let path = path.as_ref();
    lenient(path, throw_on_error, LoggerSetup::default, || {
        let text = read_config(path)?;
        parse_setup(path, &text)
    })
}

/// Load a [`LogConfig`] from `path`
///
/// # Errors
///
/// Same contract as [`get_logger_setup`]. A `LogFile` that cannot be resolved
/// is a parse error.
pub fn get_log_config(path: impl AsRef<Path>, throw_on_error: bool) -> Result<LogConfig> {
    let path = path.as_ref();
    lenient(path, throw_on_error, LogConfig::default, || {
        let text = read_config(path)?;
        let document = parse_config_document(path, &text)?;

        let log_file = match document.log_file.as_deref().map(str::trim) {
            Some(file) if !file.is_empty() => get_file_full_path(file)
                .map_err(|e| LoggerError::config_parse(path.display().to_string(), e.to_string()))?,
            _ => LogConfig::default_log_file(),
        };

        Ok(LogConfig::new(
            log_file,
            document.logger_setup.unwrap_or_default(),
        ))
    })
}

fn lenient<T>(
    path: &Path,
    throw_on_error: bool,
    fallback: impl FnOnce() -> T,
    load: impl FnOnce() -> Result<T>,
) -> Result<T> {
    match load() {
        Ok(value) => Ok(value),
        Err(e) if throw_on_error => Err(e),
        Err(LoggerError::ConfigNotFound { .. }) => Ok(fallback()),
        Err(e) => {
            diagnostics::report(&format!("loading config '{}'", path.display()), &e);
            Ok(fallback())
        }
    }
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LoggerError::config_not_found(path.display().to_string()),
        _ => LoggerError::config_parse(path.display().to_string(), e.to_string()),
    })
}

fn parse_setup(path: &Path, text: &str) -> Result<LoggerSetup> {
    let parsed = match ConfigFormat::of(path) {
        ConfigFormat::Xml => quick_xml::de::from_str(text).map_err(LoggerError::from),
        ConfigFormat::Json => serde_json::from_str(text).map_err(LoggerError::from),
    };
    parsed.map_err(|e| LoggerError::config_parse(path.display().to_string(), e.to_string()))
}

fn parse_config_document(path: &Path, text: &str) -> Result<LogConfigDocument> {
    let is_bare_setup = match ConfigFormat::of(path) {
        ConfigFormat::Xml => xml_root_element(text).as_deref() == Some(SETUP_ELEMENT),
        ConfigFormat::Json => {
            let value: serde_json::Value = serde_json::from_str(text).map_err(|e| {
                LoggerError::config_parse(path.display().to_string(), e.to_string())
            })?;
            value.as_object().is_some_and(|object| {
                !object.contains_key(SETUP_ELEMENT) && !object.contains_key(LOG_FILE_ELEMENT)
            })
        }
    };

    if is_bare_setup {
        return Ok(LogConfigDocument {
            log_file: None,
            logger_setup: Some(parse_setup(path, text)?),
        });
    }

    let parsed = match ConfigFormat::of(path) {
        ConfigFormat::Xml => quick_xml::de::from_str(text).map_err(LoggerError::from),
        ConfigFormat::Json => serde_json::from_str(text).map_err(LoggerError::from),
    };
    parsed.map_err(|e| LoggerError::config_parse(path.display().to_string(), e.to_string()))
}

/// Local name of the first element in an XML document
fn xml_root_element(text: &str) -> Option<String> {
    let mut reader = quick_xml::Reader::from_str(text);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                return Some(String::from_utf8_lossy(element.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}
