//! Logger configuration: value objects, file loading, path resolution and
//! hot-reload watching

pub mod manager;
pub mod path;
pub mod setup;
pub mod watcher;

pub use manager::{get_log_config, get_logger_setup};
pub use path::{expand_env_segments, get_file_full_path};
pub use setup::{
    LogConfig, LoggerSetup, Retention, RollingTrigger, DEFAULT_ROLLING_FILE_COUNT_LIMIT,
    DEFAULT_ROLLING_FILE_SIZE_LIMIT,
};
pub use watcher::ConfigWatcher;
