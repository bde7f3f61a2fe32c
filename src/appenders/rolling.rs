//! Rolling policy for the live log file
//!
//! The live file is never renamed: other processes may hold it open. A roll
//! copies its content into the backup series and the caller then truncates
//! it in place. Backups are named
//!
//! ```text
//! <file>.0                  single slot (count limit 0)
//! <file>.0001, .0002, ...   size rolling
//! <file>.20250108.0001      date rolling, dated by the file's last write
//! ```
//!
//! With a positive count limit `n` the newest backup is always the highest
//! existing index; once `.0001` through `.n` exist, every backup shifts down
//! one slot (`.0001` is evicted) before the newest is written to `.n`.

use crate::config::{LoggerSetup, Retention, RollingTrigger};
use chrono::{DateTime, Local, NaiveDate};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Date format embedded in date-rolled backup names
pub const BACKUP_DATE_FORMAT: &str = "%Y%m%d";

/// What the roll decision needs to know about the live file
#[derive(Debug, Clone, Copy)]
pub struct FileState {
    pub len: u64,
    pub last_write: Option<DateTime<Local>>,
}

impl FileState {
    pub fn of(metadata: &fs::Metadata) -> Self {
        Self {
            len: metadata.len(),
            last_write: metadata.modified().ok().map(DateTime::<Local>::from),
        }
    }
}

/// Result of a roll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    /// Backup now holding the rolled content
    pub backup: PathBuf,
    /// Backups that could not be shifted; the series may have a gap
    pub failed_shifts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingPolicy {
    trigger: RollingTrigger,
    size_limit: Option<u64>,
    retention: Retention,
}

impl RollingPolicy {
    pub fn new(trigger: RollingTrigger, size_limit: Option<u64>, retention: Retention) -> Self {
        Self {
            trigger,
            size_limit,
            retention,
        }
    }

    pub fn from_setup(setup: &LoggerSetup) -> Self {
        Self::new(setup.rolling_trigger(), setup.size_limit(), setup.retention())
    }

    pub fn trigger(&self) -> RollingTrigger {
        self.trigger
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    /// Whether the live file must roll before `pending` more bytes are appended
    ///
    /// The pending length is counted so the file rolls before it would
    /// overflow. An empty file never rolls.
    pub fn should_roll(&self, state: &FileState, pending: u64, today: NaiveDate) -> bool {
        if state.len == 0 {
            return false;
        }

        let over_size = self
            .size_limit
            .is_some_and(|limit| state.len.saturating_add(pending) > limit);

        match self.trigger {
            RollingTrigger::Size => over_size,
            RollingTrigger::Date => {
                let stale = state
                    .last_write
                    .is_some_and(|written| written.date_naive() < today);
                stale || over_size
            }
        }
    }

    /// Backup name without the sequence suffix
    pub fn backup_stem(&self, live: &Path, last_write: Option<DateTime<Local>>) -> PathBuf {
        match self.trigger {
            RollingTrigger::Size => live.to_path_buf(),
            RollingTrigger::Date => {
                let date = last_write.unwrap_or_else(Local::now);
                append_suffix(live, &date.format(BACKUP_DATE_FORMAT).to_string())
            }
        }
    }

    /// Copy the live file into the backup series
    ///
    /// Shifting older backups is best-effort; only the final copy of the
    /// live file decides success. On error the live file must not be
    /// truncated.
    pub fn roll(&self, live: &Path, last_write: Option<DateTime<Local>>) -> io::Result<RollOutcome> {
        let stem = self.backup_stem(live, last_write);
        let mut failed_shifts = 0;

        let backup = match self.retention {
            Retention::SingleBackup => append_suffix(&stem, "0"),
            Retention::Unlimited => sequence_path(&stem, first_unused(&stem, u32::MAX)),
            Retention::Bounded(limit) => {
                let next = last_used(&stem, limit) + 1;
                if next <= limit {
                    sequence_path(&stem, next)
                } else {
                    for index in 1..limit {
                        let from = sequence_path(&stem, index + 1);
                        if !from.exists() {
                            continue;
                        }
                        if fs::copy(&from, sequence_path(&stem, index)).is_err() {
                            failed_shifts += 1;
                        }
                    }
                    sequence_path(&stem, limit)
                }
            }
        };

        fs::copy(live, &backup)?;
        Ok(RollOutcome {
            backup,
            failed_shifts,
        })
    }
}

/// `<stem>.NNNN`
pub fn sequence_path(stem: &Path, index: u32) -> PathBuf {
    append_suffix(stem, &format!("{:04}", index))
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Highest index in `1..=limit` whose backup exists, or 0
///
/// The next backup goes directly above it, gaps below are left alone.
fn last_used(stem: &Path, limit: u32) -> u32 {
    let (Some(dir), Some(name)) = (stem.parent(), stem.file_name()) else {
        return 0;
    };
    let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
    let prefix = format!("{}.", name.to_string_lossy());

    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let file_name = entry.file_name();
            let digits = file_name.to_str()?.strip_prefix(&prefix)?;
            if digits.len() < 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            digits.parse::<u32>().ok()
        })
        .filter(|index| (1..=limit).contains(index))
        .max()
        .unwrap_or(0)
}

/// Smallest index from 1 whose backup does not exist, or `limit + 1` when
/// `1..=limit` are all taken
fn first_unused(stem: &Path, limit: u32) -> u32 {
    (1..=limit)
        .find(|&index| !sequence_path(stem, index).exists())
        .unwrap_or_else(|| limit.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::tempdir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 8).unwrap()
    }

    fn at(date: NaiveDate) -> Option<DateTime<Local>> {
        Local
            .from_local_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
            .single()
    }

    fn state(len: u64, last_write: Option<DateTime<Local>>) -> FileState {
        FileState { len, last_write }
    }

    #[test]
    fn test_size_trigger_counts_pending_bytes() {
        let policy = RollingPolicy::new(RollingTrigger::Size, Some(100), Retention::Bounded(2));
        assert!(!policy.should_roll(&state(60, at(today())), 40, today()));
        assert!(policy.should_roll(&state(60, at(today())), 41, today()));
        assert!(!policy.should_roll(&state(0, at(today())), 500, today()));
    }

    #[test]
    fn test_size_trigger_without_limit_never_rolls() {
        let policy = RollingPolicy::new(RollingTrigger::Size, None, Retention::Unlimited);
        assert!(!policy.should_roll(&state(u64::MAX - 1, at(today())), u64::MAX, today()));
    }

    #[test]
    fn test_date_trigger() {
        let yesterday = today() - Duration::days(1);
        let policy = RollingPolicy::new(RollingTrigger::Date, None, Retention::Unlimited);
        assert!(policy.should_roll(&state(10, at(yesterday)), 0, today()));
        assert!(!policy.should_roll(&state(10, at(today())), 1_000_000, today()));
        assert!(!policy.should_roll(&state(10, None), 0, today()));

        let with_size = RollingPolicy::new(RollingTrigger::Date, Some(100), Retention::Unlimited);
        assert!(with_size.should_roll(&state(90, at(today())), 20, today()));
    }

    #[test]
    fn test_backup_names() {
        let live = Path::new("/var/log/app.log");
        assert_eq!(sequence_path(live, 7), PathBuf::from("/var/log/app.log.0007"));

        let policy = RollingPolicy::new(RollingTrigger::Date, None, Retention::Unlimited);
        assert_eq!(
            policy.backup_stem(live, at(today())),
            PathBuf::from("/var/log/app.log.20250108")
        );
    }

    #[test]
    fn test_single_backup_slot_is_overwritten() {
        let dir = tempdir().unwrap();
        let live = dir.path().join("app.log");
        let policy = RollingPolicy::new(RollingTrigger::Size, Some(1), Retention::SingleBackup);

        fs::write(&live, "first").unwrap();
        let outcome = policy.roll(&live, None).unwrap();
        assert_eq!(outcome.backup, dir.path().join("app.log.0"));

        fs::write(&live, "second").unwrap();
        policy.roll(&live, None).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("app.log.0")).unwrap(), "second");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_unlimited_uses_next_free_index() {
        let dir = tempdir().unwrap();
        let live = dir.path().join("app.log");
        let policy = RollingPolicy::new(RollingTrigger::Size, Some(1), Retention::Unlimited);

        for round in 1..=5 {
            fs::write(&live, format!("round {}", round)).unwrap();
            let outcome = policy.roll(&live, None).unwrap();
            assert_eq!(outcome.backup, sequence_path(&live, round));
        }
        assert_eq!(
            fs::read_to_string(sequence_path(&live, 3)).unwrap(),
            "round 3"
        );
    }

    #[test]
    fn test_bounded_shifts_and_evicts_oldest() {
        let dir = tempdir().unwrap();
        let live = dir.path().join("app.log");
        let policy = RollingPolicy::new(RollingTrigger::Size, Some(1), Retention::Bounded(3));

        for round in 1..=6 {
            fs::write(&live, format!("round {}", round)).unwrap();
            policy.roll(&live, None).unwrap();
        }

        let backups: Vec<_> = (1..=3)
            .map(|i| fs::read_to_string(sequence_path(&live, i)).unwrap())
            .collect();
        assert_eq!(backups, vec!["round 4", "round 5", "round 6"]);
        assert!(!sequence_path(&live, 4).exists());
    }

    #[test]
    fn test_bounded_appends_after_highest_backup() {
        let dir = tempdir().unwrap();
        let live = dir.path().join("app.log");
        let policy = RollingPolicy::new(RollingTrigger::Size, Some(1), Retention::Bounded(3));

        fs::write(sequence_path(&live, 2), "old").unwrap();
        fs::write(&live, "new").unwrap();
        let outcome = policy.roll(&live, None).unwrap();
        assert_eq!(outcome.backup, sequence_path(&live, 3));
        assert!(!sequence_path(&live, 1).exists());
    }

    #[test]
    fn test_gap_in_series_still_evicts_oldest_first() {
        let dir = tempdir().unwrap();
        let live = dir.path().join("app.log");
        let policy = RollingPolicy::new(RollingTrigger::Size, Some(1), Retention::Bounded(2));
        fs::write(sequence_path(&live, 2), "oldest").unwrap();

        for content in ["first", "second", "third"] {
            fs::write(&live, content).unwrap();
            let outcome = policy.roll(&live, None).unwrap();
            assert_eq!(outcome.backup, sequence_path(&live, 2));
            assert_eq!(outcome.failed_shifts, 0);
        }

        assert_eq!(fs::read_to_string(sequence_path(&live, 1)).unwrap(), "second");
        assert_eq!(fs::read_to_string(sequence_path(&live, 2)).unwrap(), "third");
    }

    #[test]
    fn test_date_backups_keep_days_apart() {
        let dir = tempdir().unwrap();
        let live = dir.path().join("app.log");
        let policy = RollingPolicy::new(RollingTrigger::Date, None, Retention::Bounded(2));
        let yesterday = today() - Duration::days(1);

        fs::write(&live, "day one").unwrap();
        let first = policy.roll(&live, at(yesterday)).unwrap();
        fs::write(&live, "day two").unwrap();
        let second = policy.roll(&live, at(today())).unwrap();

        assert_eq!(first.backup, dir.path().join("app.log.20250107.0001"));
        assert_eq!(second.backup, dir.path().join("app.log.20250108.0001"));
    }

    #[test]
    fn test_failed_copy_is_an_error() {
        let dir = tempdir().unwrap();
        let live = dir.path().join("missing.log");
        let policy = RollingPolicy::new(RollingTrigger::Size, Some(1), Retention::Unlimited);
        assert!(policy.roll(&live, None).is_err());
    }
}
