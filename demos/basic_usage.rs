//! Basic logger usage example
//!
//! Demonstrates console and file output, level filtering and the logging
//! macros.
//!
//! Run with: cargo run --example basic_usage

use multiprocess_logger::prelude::*;
use multiprocess_logger::{info, warn};

fn main() -> Result<()> {
    println!("=== Multi-process Logger - Basic Usage Example ===\n");

    let log_dir = std::env::temp_dir().join("multiprocess_logger_demo");
    let log_file = log_dir.join("basic.log");

    println!("1. Logging at different levels:");
    let mut logger = Logger::new(&log_file, LoggerSetup::default());
    logger.trace("This is a trace message")?;
    logger.debug("This is a debug message")?;
    logger.info("This is an info message")?;
    logger.warn("This is a warning message")?;
    logger.error("This is an error message")?;
    logger.fatal("This is a fatal message")?;
    logger.close(DEFAULT_SHUTDOWN_TIMEOUT);

    println!("\n2. Logging with a higher threshold and no brackets:");
    let setup = LoggerSetup {
        use_bracket: false,
        ..LoggerSetup::default().with_level(LogLevel::Info)
    };
    let mut logger = Logger::builder()
        .log_file(&log_file)
        .setup(setup)
        .colors(false)
        .build();
    logger.debug("Debug message (hidden)")?;
    info!(logger, "Info message from process {}", std::process::id())?;
    warn!(logger, "Disk usage at {}%", 91)?;
    logger.flush()?;

    println!("\nLines written to {}:", log_file.display());
    println!("{}", std::fs::read_to_string(&log_file)?);

    logger.close(DEFAULT_SHUTDOWN_TIMEOUT);
    println!("=== Example completed successfully! ===");
    Ok(())
}
