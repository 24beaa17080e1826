//! Property-based tests for logface using proptest

use logface::backends::CaptureProvider;
use logface::core::{merge_fields, truncate_message, with_config, Field};
use logface::prelude::*;
use proptest::prelude::*;
use std::time::Duration;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
        Just(LogLevel::Panic),
    ]
}

fn any_field() -> impl Strategy<Value = Field> {
    (
        "[a-d]",
        prop_oneof![
            any::<i64>().prop_map(FieldValue::Int),
            any::<bool>().prop_map(FieldValue::Bool),
            "[a-z]{0,8}".prop_map(FieldValue::String),
        ],
    )
        .prop_map(|(key, value)| Field::new(key, value))
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Labels parse back to the same level
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.as_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
        prop_assert_eq!(level.to_string(), level.as_str());
    }

    /// Ordering follows the numeric value
    #[test]
    fn test_log_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a <= b, (a as u8) <= (b as u8));
        prop_assert_eq!(a < b, (a as u8) < (b as u8));
    }

    /// Raw values map to the same label as the level
    #[test]
    fn test_log_level_numeric_labels(value in 0u8..10) {
        match LogLevel::from_u8(value) {
            Some(level) => prop_assert_eq!(LogLevel::label(value), level.as_str()),
            None => prop_assert_eq!(LogLevel::label(value), "UNKNOWN"),
        }
    }
}

// ============================================================================
// Gating Tests
// ============================================================================

proptest! {
    /// A logger set to `threshold` emits exactly the entries at or above it
    #[test]
    fn test_gating_matches_threshold(threshold in any_level(), level in any_level()) {
        let provider = CaptureProvider::new();
        let logger = provider.create("gate", &[with_level(threshold)]).unwrap();

        let line = logger.emit(level, "probe", &[]);
        prop_assert_eq!(line.is_some(), threshold <= level);
        prop_assert_eq!(provider.store().len(), usize::from(threshold <= level));
        prop_assert_eq!(logger.is_enabled(level), threshold <= level);
    }

    /// The named predicates agree with `is_enabled`
    #[test]
    fn test_enabled_predicates(threshold in any_level()) {
        let provider = CaptureProvider::new();
        let logger = provider.create("gate", &[]).unwrap();
        logger.set_level(threshold);

        prop_assert_eq!(logger.is_debug_enabled(), logger.is_enabled(LogLevel::Debug));
        prop_assert_eq!(logger.is_info_enabled(), threshold <= LogLevel::Info);
        prop_assert_eq!(logger.is_warn_enabled(), threshold <= LogLevel::Warn);
        prop_assert_eq!(logger.is_error_enabled(), threshold <= LogLevel::Error);
        prop_assert_eq!(logger.is_fatal_enabled(), threshold <= LogLevel::Fatal);
        prop_assert!(logger.is_panic_enabled());
    }
}

// ============================================================================
// Configuration Tests
// ============================================================================

proptest! {
    /// `to_options` resolves to the same options as applying each setting by hand
    #[test]
    fn test_to_options_equivalence(
        level in any_level(),
        json in any::<bool>(),
        path in "(stdout|stderr|/tmp/[a-z]{1,8}\\.log)",
        size in 1u64..1000,
        age_secs in 1u64..1_000_000,
        files in 1usize..50,
        compress in any::<bool>(),
        message_kb in 0usize..64,
    ) {
        let format = if json { OutputFormat::Json } else { OutputFormat::Text };
        let config = LogConfig::new()
            .with_level(level)
            .with_format(format.as_str())
            .with_output_path(path.clone())
            .with_max_log_size(size)
            .with_max_log_age(Duration::from_secs(age_secs))
            .with_max_log_files(files)
            .with_compress_logs(compress)
            .with_max_message_size(message_kb);

        let manual = LoggerOptions::default().apply(&[
            with_level(level),
            with_format(format),
            with_output_path(path),
            with_max_log_size(size),
            with_max_log_age(Duration::from_secs(age_secs)),
            with_max_log_files(files),
            with_compress_logs(compress),
            with_max_message_size(message_kb),
            with_config(ConfigMap::new()),
        ]);
        prop_assert_eq!(LoggerOptions::default().apply(&config.to_options()), manual);
    }

    /// Validating twice changes nothing the second time
    #[test]
    fn test_validate_is_idempotent(
        name in "[ a-z]{0,6}",
        format in "(text|JSON|xml|)",
        size in 0u64..3,
        files in 0usize..3,
    ) {
        let mut config = LogConfig::new()
            .with_name(name)
            .with_format(format)
            .with_max_log_size(size)
            .with_max_log_files(files);
        config.validate();
        let once = config.clone();
        config.validate();
        prop_assert_eq!(config.clone(), once);
        prop_assert!(config.format == "text" || config.format == "json");
        prop_assert!(!config.name.trim().is_empty());
    }
}

// ============================================================================
// Field and Truncation Tests
// ============================================================================

proptest! {
    /// Merged keys are unique, ordered by first occurrence and hold the last value
    #[test]
    fn test_merge_fields_last_write_wins(
        base in prop::collection::vec(any_field(), 0..6),
        extra in prop::collection::vec(any_field(), 0..6),
    ) {
        let merged = merge_fields(&base, &extra);
        let all: Vec<&Field> = base.iter().chain(extra.iter()).collect();

        let mut first_seen: Vec<&str> = Vec::new();
        for f in &all {
            if !first_seen.contains(&f.key.as_str()) {
                first_seen.push(&f.key);
            }
        }
        let keys: Vec<&str> = merged.iter().map(|f| f.key.as_str()).collect();
        prop_assert_eq!(keys, first_seen);

        for f in &merged {
            let last = all.iter().rev().find(|candidate| candidate.key == f.key).unwrap();
            prop_assert_eq!(&f.value, &last.value);
        }
    }

    /// Truncated text never exceeds the limit and keeps a prefix of the input
    #[test]
    fn test_truncation_bounds(text in "\\PC{0,3000}", max_kb in 0usize..3) {
        let out = truncate_message(&text, max_kb);
        let limit = max_kb * 1024;
        if limit == 0 || text.len() <= limit {
            prop_assert_eq!(out.as_ref(), text.as_str());
        } else {
            prop_assert!(out.len() <= limit);
            prop_assert!(out.ends_with("..."));
            prop_assert!(text.starts_with(&out[..out.len() - 3]));
        }
    }
}
