//! Config hot reload example
//!
//! Writes a LogConfig file, logs through it, then edits the file and shows
//! the logger picking up the new level on its next call.
//!
//! Run with: cargo run --example config_reload

use multiprocess_logger::prelude::*;
use std::time::{Duration, Instant};

const QUIET: &str = r#"<LogConfig>
  <LogFile>$TMPDIR$/multiprocess_logger_demo/reload.log</LogFile>
  <LoggerSetup>
    <Level>WARN</Level>
    <DateTimeFormat>%H:%M:%S%.3f</DateTimeFormat>
  </LoggerSetup>
</LogConfig>"#;

const VERBOSE: &str = r#"<LogConfig>
  <LogFile>$TMPDIR$/multiprocess_logger_demo/reload.log</LogFile>
  <LoggerSetup>
    <Level>DEBUG</Level>
    <DateTimeFormat>%H:%M:%S%.3f</DateTimeFormat>
    <EnableStackInfo>true</EnableStackInfo>
  </LoggerSetup>
</LogConfig>"#;

fn main() -> Result<()> {
    println!("=== Multi-process Logger - Config Reload Example ===\n");

    if std::env::var_os("TMPDIR").is_none() {
        std::env::set_var("TMPDIR", std::env::temp_dir());
    }
    let config_dir = std::env::temp_dir().join("multiprocess_logger_demo");
    std::fs::create_dir_all(&config_dir)?;
    let config_file = config_dir.join("reload.xml");
    std::fs::write(&config_file, QUIET)?;

    let mut logger = Logger::with_config_file(&config_file);
    println!("Logging to {}", logger.log_file().display());

    logger.debug("hidden: level is WARN")?;
    logger.warn("visible: level is WARN")?;

    std::fs::write(&config_file, VERBOSE)?;
    let deadline = Instant::now() + Duration::from_secs(5);
    while logger.setup().level != LogLevel::Debug && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
        logger.trace("polling for reload")?;
    }

    logger.debug("visible after reload, with call site")?;
    println!("\nReloads observed: {}", logger.metrics().reloads());
    logger.close(DEFAULT_SHUTDOWN_TIMEOUT);
    Ok(())
}
