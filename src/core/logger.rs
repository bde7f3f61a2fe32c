//! Main logger implementation
//!
//! Callers render lines on their own thread and push them onto an unbounded
//! channel. One writer thread drains everything queued since it last woke
//! and hands the batch to the [`MultiProcessFileAppender`] in a single locked
//! write. Console output happens directly on the calling thread.

use super::{
    diagnostics,
    error::{LoggerError, Result},
    log_entry::LogEntry,
    log_level::LogLevel,
    metrics::LoggerMetrics,
};
use crate::appenders::{ConsoleAppender, MultiProcessFileAppender};
use crate::config::{get_log_config, get_logger_setup, ConfigWatcher, LogConfig, LoggerSetup};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default shutdown timeout for logger cleanup (5 seconds)
///
/// This timeout is used when the logger is dropped without explicit close.
/// For custom timeout control, use the `close()` method instead.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const WRITER_THREAD_NAME: &str = "log-writer";

enum Command {
    Line(String),
    /// Acknowledged once every line queued before it has been written
    Flush(Sender<()>),
}

/// Where a reload reads its configuration from
#[derive(Debug, Clone)]
enum ConfigSource {
    Static,
    SetupFile(PathBuf),
    ConfigFile(PathBuf),
}

impl ConfigSource {
    fn watched_path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Static => None,
            ConfigSource::SetupFile(path) | ConfigSource::ConfigFile(path) => Some(path),
        }
    }
}

/// State the writer thread shares with the logger
///
/// Both slots are replaced wholesale on reload; readers clone the `Arc` and
/// drop the guard before doing any I/O.
struct Shared {
    setup: RwLock<Arc<LoggerSetup>>,
    log_file: RwLock<PathBuf>,
    appender: RwLock<Option<Arc<MultiProcessFileAppender>>>,
    metrics: Arc<LoggerMetrics>,
}

pub struct Logger {
    shared: Arc<Shared>,
    source: ConfigSource,
    watcher: Option<ConfigWatcher>,
    console: ConsoleAppender,
    reload_lock: Mutex<()>,
    sender: Option<Sender<Command>>,
    writer_handle: Option<thread::JoinHandle<()>>,
    closed: bool,
}

impl Logger {
    /// Log to `log_file` with a fixed setup
    ///
    /// Never fails: if the file appender cannot be created the logger keeps
    /// writing to the console and the failure is reported on stderr.
    #[must_use]
    pub fn new(log_file: impl AsRef<Path>, setup: LoggerSetup) -> Self {
        Self::start(
            log_file.as_ref().to_path_buf(),
            setup,
            ConfigSource::Static,
            ConsoleAppender::new(),
            true,
        )
    }

    /// Log to `log_file` with the setup read from `setup_file`, reloading it
    /// whenever the file changes
    #[must_use]
    pub fn with_setup_file(log_file: impl AsRef<Path>, setup_file: impl AsRef<Path>) -> Self {
        Self::builder()
            .log_file(log_file)
            .setup_file(setup_file)
            .build()
    }

    /// Log file and setup both come from `config_file`, reloaded on change
    #[must_use]
    pub fn with_config_file(config_file: impl AsRef<Path>) -> Self {
        Self::builder().config_file(config_file).build()
    }

    fn start(
        log_file: PathBuf,
        setup: LoggerSetup,
        source: ConfigSource,
        console: ConsoleAppender,
        watch: bool,
    ) -> Self {
        let metrics = Arc::new(LoggerMetrics::new());
        let shared = Arc::new(Shared {
            setup: RwLock::new(Arc::new(LoggerSetup::default())),
            log_file: RwLock::new(log_file.clone()),
            appender: RwLock::new(None),
            metrics,
        });
        Self::install(&shared, log_file, setup);

        let watcher = match source.watched_path() {
            Some(path) if watch => match ConfigWatcher::new(path) {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    diagnostics::report_with(&shared.metrics, "watching config file", &e);
                    None
                }
            },
            _ => None,
        };

        let (sender, receiver) = unbounded();
        let worker_shared = Arc::clone(&shared);
        let writer_handle = match thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || run_writer(receiver, worker_shared))
        {
            Ok(handle) => Some(handle),
            Err(e) => {
                let err = LoggerError::from(e);
                diagnostics::report_with(&shared.metrics, "starting writer thread", &err);
                None
            }
        };

        Self {
            shared,
            source,
            watcher,
            console,
            reload_lock: Mutex::new(()),
            sender: writer_handle.as_ref().map(|_| sender),
            writer_handle,
            closed: false,
        }
    }

    /// Swap in a new setup and, if it writes to a file, a fresh appender
    ///
    /// The previous appender is disposed after the swap; a batch the writer
    /// is still holding for it is retried against the new one.
    fn install(shared: &Shared, log_file: PathBuf, setup: LoggerSetup) {
        let setup = Arc::new(setup);
        let appender = if setup.write_to_file {
            MultiProcessFileAppender::with_metrics(
                &log_file,
                Arc::clone(&setup),
                Arc::clone(&shared.metrics),
            )
            .ok()
            .map(Arc::new)
        } else {
            None
        };

        *shared.setup.write() = setup;
        *shared.log_file.write() = log_file;
        let previous = std::mem::replace(&mut *shared.appender.write(), appender);
        if let Some(previous) = previous {
            previous.dispose();
        }
    }

    /// Current setup
    pub fn setup(&self) -> Arc<LoggerSetup> {
        Arc::clone(&self.shared.setup.read())
    }

    /// Log file as configured, before path resolution
    pub fn log_file(&self) -> PathBuf {
        self.shared.log_file.read().clone()
    }

    /// The file appender in use, if file output is active
    pub fn file_appender(&self) -> Option<Arc<MultiProcessFileAppender>> {
        self.shared.appender.read().clone()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.shared.metrics
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether a line at `level` would be written anywhere
    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.shared.setup.read().accepts(level)
    }

    /// Re-read the configuration source and rebuild the file appender
    ///
    /// A logger built from a fixed setup keeps its setup and only reopens
    /// the appender.
    ///
    /// # Errors
    ///
    /// `LoggerStopped` after [`close`](Self::close).
    pub fn reload_config(&self) -> Result<()> {
        if self.closed {
            return Err(LoggerError::LoggerStopped);
        }
        let _guard = self.reload_lock.lock();

        let (log_file, setup) = match &self.source {
            ConfigSource::Static => (self.log_file(), (*self.setup()).clone()),
            ConfigSource::SetupFile(path) => (self.log_file(), get_logger_setup(path, false)?),
            ConfigSource::ConfigFile(path) => {
                let LogConfig {
                    log_file,
                    logger_setup,
                } = get_log_config(path, false)?;
                (log_file, logger_setup)
            }
        };

        Self::install(&self.shared, log_file, setup);
        self.shared.metrics.record_reload();
        Ok(())
    }

    fn reload_if_changed(&self) {
        let changed = self
            .watcher
            .as_ref()
            .is_some_and(ConfigWatcher::take_changed);
        if changed {
            if let Err(e) = self.reload_config() {
                diagnostics::report_with(&self.shared.metrics, "reloading config", &e);
            }
        }
    }

    /// Log a message
    ///
    /// A pending config change is applied first, on this thread. The line is
    /// then written to the console (if enabled) and queued for the file.
    ///
    /// # Errors
    ///
    /// `LoggerStopped` after [`close`](Self::close). File write failures are
    /// never returned.
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) -> Result<()> {
        if self.closed {
            return Err(LoggerError::LoggerStopped);
        }
        self.reload_if_changed();
        self.emit(level, message.as_ref())
    }

    /// Log pre-formatted arguments, formatting only if the level is enabled
    ///
    /// # Errors
    ///
    /// Same as [`log`](Self::log).
    #[track_caller]
    pub fn log_args(&self, level: LogLevel, args: fmt::Arguments<'_>) -> Result<()> {
        if self.closed {
            return Err(LoggerError::LoggerStopped);
        }
        self.reload_if_changed();
        if !self.is_enabled(level) {
            return Ok(());
        }
        match args.as_str() {
            Some(message) => self.emit(level, message),
            None => self.emit(level, &args.to_string()),
        }
    }

    #[track_caller]
    fn emit(&self, level: LogLevel, message: &str) -> Result<()> {
        let setup = self.setup();
        if !setup.accepts(level) {
            return Ok(());
        }

        let mut entry = LogEntry::new(level, message);
        if setup.enable_stack_info {
            entry = entry.with_location(Location::caller());
        }
        let line = entry.render(&setup);

        if setup.write_to_console {
            self.console.write(&entry, &line);
        }

        if setup.write_to_file {
            if let Some(sender) = &self.sender {
                self.shared.metrics.record_queued();
                sender
                    .send(Command::Line(line))
                    .map_err(|_| LoggerError::LoggerStopped)?;
            }
        }
        Ok(())
    }

    #[track_caller]
    pub fn trace(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Trace, message)
    }

    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Debug, message)
    }

    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Info, message)
    }

    #[track_caller]
    pub fn warn(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Warn, message)
    }

    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Error, message)
    }

    #[track_caller]
    pub fn fatal(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Fatal, message)
    }

    /// Block until every line queued before this call is on disk
    ///
    /// # Errors
    ///
    /// `LoggerStopped` after [`close`](Self::close) or if the writer thread
    /// is gone.
    pub fn flush(&self) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(LoggerError::LoggerStopped)?;
        let (ack_sender, ack_receiver) = bounded(1);
        sender
            .send(Command::Flush(ack_sender))
            .map_err(|_| LoggerError::LoggerStopped)?;
        ack_receiver
            .recv()
            .map_err(|_| LoggerError::LoggerStopped)?;
        self.console.flush();
        Ok(())
    }

    /// Stop accepting lines, drain the queue and release the file lock
    ///
    /// Returns `false` if the writer did not finish within `timeout` or
    /// panicked; lines still queued at that point may be lost. Calling it
    /// again is a no-op returning `true`.
    pub fn close(&mut self, timeout: Duration) -> bool {
        if self.closed {
            return true;
        }
        self.closed = true;
        self.watcher = None;

        // Closing the channel lets the writer drain what is left and exit
        drop(self.sender.take());

        let mut clean = true;
        if let Some(handle) = self.writer_handle.take() {
            let start = Instant::now();
            loop {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        eprintln!("[LOGGER ERROR] Writer thread panicked during close: {:?}", e);
                        clean = false;
                    }
                    break;
                }

                if start.elapsed() >= timeout {
                    diagnostics::warn(format!(
                        "Writer thread did not finish within {:?}; {} queued line(s) may be lost",
                        timeout,
                        self.shared.metrics.pending()
                    ));
                    clean = false;
                    break;
                }

                thread::sleep(Duration::from_millis(10));
            }
        }

        if let Some(appender) = self.shared.appender.write().take() {
            appender.dispose();
        }
        self.console.flush();
        clean
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.close(DEFAULT_SHUTDOWN_TIMEOUT);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("log_file", &self.log_file())
            .field("source", &self.source)
            .field("watching", &self.watcher.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}

/// Writer thread body
///
/// Blocks for the first command, then takes everything else already queued
/// so a burst of lines costs one lock and one write.
fn run_writer(receiver: Receiver<Command>, shared: Arc<Shared>) {
    let mut batch = Vec::new();
    while let Ok(first) = receiver.recv() {
        for command in std::iter::once(first).chain(receiver.try_iter()) {
            match command {
                Command::Line(line) => batch.push(line),
                Command::Flush(ack) => {
                    write_batch(&shared, &mut batch);
                    let _ = ack.send(());
                }
            }
        }
        write_batch(&shared, &mut batch);
    }
}

fn write_batch(shared: &Shared, batch: &mut Vec<String>) {
    if batch.is_empty() {
        return;
    }

    // A reload may dispose the appender we picked up; retry once with its
    // replacement.
    for _ in 0..2 {
        let Some(appender) = shared.appender.read().clone() else {
            break;
        };
        match appender.write(batch) {
            Ok(()) => {
                shared.metrics.record_batch(batch.len());
                break;
            }
            Err(LoggerError::Disposed { .. }) => continue,
            Err(e) => {
                diagnostics::report_with(&shared.metrics, "writing batch", &e);
                break;
            }
        }
    }
    batch.clear();
}

/// Builder for [`Logger`]
///
/// # Example
///
/// ```no_run
/// use multiprocess_logger::prelude::*;
///
/// let logger = Logger::builder()
///     .log_file("logs/service.log")
///     .level(LogLevel::Info)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct LoggerBuilder {
    log_file: Option<PathBuf>,
    setup: LoggerSetup,
    setup_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    use_colors: bool,
    watch: bool,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            log_file: None,
            setup: LoggerSetup::default(),
            setup_file: None,
            config_file: None,
            use_colors: true,
            watch: true,
        }
    }

    /// Target log file; defaults to `<executable>.log`
    #[must_use = "builder methods return a new value"]
    pub fn log_file(mut self, path: impl AsRef<Path>) -> Self {
        self.log_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Fixed setup, ignored when a setup or config file is given
    #[must_use = "builder methods return a new value"]
    pub fn setup(mut self, setup: LoggerSetup) -> Self {
        self.setup = setup;
        self
    }

    /// Shorthand for adjusting the level of the fixed setup
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.setup.level = level;
        self
    }

    /// Read the setup from a `LoggerSetup` document
    #[must_use = "builder methods return a new value"]
    pub fn setup_file(mut self, path: impl AsRef<Path>) -> Self {
        self.setup_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Read log file and setup from a `LogConfig` document; takes precedence
    /// over everything else
    #[must_use = "builder methods return a new value"]
    pub fn config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Whether to reload when the setup or config file changes (default on)
    #[must_use = "builder methods return a new value"]
    pub fn watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    /// Build the Logger
    pub fn build(self) -> Logger {
        let console = ConsoleAppender::with_colors(self.use_colors);

        if let Some(config_file) = self.config_file {
            let LogConfig {
                log_file,
                logger_setup,
            } = get_log_config(&config_file, false).unwrap_or_default();
            return Logger::start(
                log_file,
                logger_setup,
                ConfigSource::ConfigFile(config_file),
                console,
                self.watch,
            );
        }

        let log_file = self.log_file.unwrap_or_else(LogConfig::default_log_file);
        match self.setup_file {
            Some(setup_file) => {
                let setup = get_logger_setup(&setup_file, false).unwrap_or_default();
                Logger::start(
                    log_file,
                    setup,
                    ConfigSource::SetupFile(setup_file),
                    console,
                    self.watch,
                )
            }
            None => Logger::start(log_file, self.setup, ConfigSource::Static, console, false),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Create a new builder for configuring a Logger
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}
