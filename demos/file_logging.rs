//! Shared file logging example
//!
//! Starts several worker processes (copies of this example) that all log to
//! the same rolling file, then prints the resulting backup series.
//!
//! Run with: cargo run --example file_logging

use multiprocess_logger::info;
use multiprocess_logger::prelude::*;
use std::path::Path;
use std::process::Command;

const WORKER_ARG: &str = "--worker";
const WORKERS: usize = 4;
const LINES_PER_WORKER: usize = 500;

fn setup() -> LoggerSetup {
    LoggerSetup::default()
        .with_outputs(false, true)
        .with_size_rolling(16 * 1024, 3)
}

fn run_worker(log_file: &Path, id: &str) -> Result<()> {
    let mut logger = Logger::new(log_file, setup());
    for i in 0..LINES_PER_WORKER {
        info!(logger, "worker {} (pid {}) line {}", id, std::process::id(), i)?;
    }
    logger.close(DEFAULT_SHUTDOWN_TIMEOUT);
    Ok(())
}

fn main() -> Result<()> {
    let log_dir = std::env::temp_dir().join("multiprocess_logger_demo");
    let log_file = log_dir.join("shared.log");

    let args: Vec<String> = std::env::args().collect();
    if args.len() == 3 && args[1] == WORKER_ARG {
        return run_worker(&log_file, &args[2]);
    }

    println!("=== Multi-process Logger - Shared File Example ===\n");
    let exe = std::env::current_exe()?;
    let mut children = Vec::new();
    for id in 0..WORKERS {
        children.push(Command::new(&exe).arg(WORKER_ARG).arg(id.to_string()).spawn()?);
    }
    for mut child in children {
        child.wait()?;
    }

    let mut files: Vec<_> = std::fs::read_dir(&log_dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.to_string_lossy().contains("shared.log"))
        .collect();
    files.sort();

    println!("{} workers wrote {} lines each; files:", WORKERS, LINES_PER_WORKER);
    for file in files {
        let lines = std::fs::read_to_string(&file)?.lines().count();
        println!("  {} ({} lines)", file.display(), lines);
    }
    Ok(())
}
