//! Property-based tests for multiprocess_logger using proptest

use multiprocess_logger::appenders::{mutex_name, LOCK_NAME_PREFIX};
use multiprocess_logger::config::{expand_env_segments, get_file_full_path};
use multiprocess_logger::prelude::*;
use proptest::prelude::*;
use std::path::{Path, MAIN_SEPARATOR};

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop::sample::select(LogLevel::ALL.to_vec())
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Test that LogLevel string conversions roundtrip correctly
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
        prop_assert_eq!(format!("{}", level), level.to_str());
    }

    /// Test that LogLevel ordering follows the discriminants
    #[test]
    fn test_log_level_ordering(level1 in any_level(), level2 in any_level()) {
        prop_assert_eq!(level1 <= level2, (level1 as u8) <= (level2 as u8));
        prop_assert_eq!(level1 > level2, (level1 as u8) > (level2 as u8));
    }

    /// Test that parsing ignores case and surrounding whitespace
    #[test]
    fn test_log_level_case_insensitive(level in any_level(), pad in "[ \t]{0,3}") {
        let input = format!("{}{}{}", pad, level.to_str().to_lowercase(), pad);
        prop_assert_eq!(input.parse::<LogLevel>().unwrap(), level);
    }
}

// ============================================================================
// Filtering
// ============================================================================

proptest! {
    /// A line is produced exactly when it clears the threshold and some
    /// output is enabled
    #[test]
    fn test_accepts_predicate(
        threshold in any_level(),
        level in any_level(),
        console in any::<bool>(),
        file in any::<bool>(),
    ) {
        let setup = LoggerSetup::default()
            .with_level(threshold)
            .with_outputs(console, file);
        prop_assert_eq!(setup.accepts(level), level >= threshold && (console || file));
    }

    #[test]
    fn test_retention_from_count_limit(limit in any::<i32>()) {
        let retention = Retention::from_count_limit(limit);
        match limit {
            0 => prop_assert_eq!(retention, Retention::SingleBackup),
            n if n < 0 => prop_assert_eq!(retention, Retention::Unlimited),
            n => prop_assert_eq!(retention, Retention::Bounded(n as u32)),
        }
    }
}

// ============================================================================
// LogEntry Message Sanitization Tests
// ============================================================================

proptest! {
    /// Rendered lines are always exactly one physical line
    #[test]
    fn test_rendered_line_is_single_line(message in ".*", bracket in any::<bool>()) {
        let setup = LoggerSetup { use_bracket: bracket, ..LoggerSetup::default() };
        let line = LogEntry::new(LogLevel::Info, &message).render(&setup);

        prop_assert!(line.ends_with('\n'));
        prop_assert_eq!(line.matches('\n').count(), 1);
        prop_assert!(!line.contains('\r'));
    }
}

// ============================================================================
// Lock names and paths
// ============================================================================

proptest! {
    /// The lock name depends only on the lowercased path
    #[test]
    fn test_mutex_name_ignores_case(path in "/[A-Za-z0-9_]{1,12}(/[A-Za-z0-9_.]{1,12}){0,4}") {
        let upper = mutex_name(Path::new(&path.to_uppercase()));
        let lower = mutex_name(Path::new(&path.to_lowercase()));
        prop_assert_eq!(&upper, &lower);
        prop_assert!(upper.starts_with(LOCK_NAME_PREFIX));
        prop_assert_eq!(upper.len(), LOCK_NAME_PREFIX.len() + 32);
    }

    /// Paths without variable segments pass through expansion unchanged
    #[test]
    fn test_expansion_without_variables(segments in prop::collection::vec("[a-zA-Z0-9_.-]{1,10}", 1..6)) {
        let path = segments.join(&MAIN_SEPARATOR.to_string());
        prop_assert_eq!(expand_env_segments(&path), path);
    }

    /// Unset variables expand to empty segments
    #[test]
    fn test_unset_variable_segment_is_empty(name in "[A-Z]{6,12}") {
        let var = format!("MULTIPROCESS_LOGGER_UNSET_{}", name);
        let path = format!("${}$", var);
        prop_assert_eq!(expand_env_segments(&path), "");
    }

    /// Full paths are absolute and stable under re-resolution
    #[test]
    fn test_full_path_is_absolute_and_idempotent(
        segments in prop::collection::vec("[a-z0-9_]{1,8}", 1..5)
    ) {
        let relative = segments.join("/");
        let full = get_file_full_path(&relative).unwrap();
        prop_assert!(full.is_absolute());
        prop_assert!(full.ends_with(&relative));

        let again = get_file_full_path(&full.to_string_lossy()).unwrap();
        prop_assert_eq!(full, again);
    }
}
