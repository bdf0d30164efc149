//! Property-based tests for logz using proptest

use logz::metrics::MetricsRegistry;
use logz::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

fn any_level() -> impl Strategy<Value = Level> {
    proptest::sample::select(Level::ALL.to_vec())
}

fn loggable_level() -> impl Strategy<Value = Level> {
    any_level().prop_filter("silent is never written", |l| *l != Level::Silent)
}

fn field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        "[a-zA-Z0-9 _.-]{0,24}".prop_map(FieldValue::String),
        any::<i64>().prop_map(FieldValue::Int),
        any::<bool>().prop_map(FieldValue::Bool),
    ]
}

// ============================================================================
// Level Tests
// ============================================================================

proptest! {
    /// Level names round trip through parse, in any letter case
    #[test]
    fn test_level_name_roundtrip(level in any_level(), upper in any::<bool>()) {
        let name = if upper { level.to_str().to_ascii_uppercase() } else { level.to_str().to_string() };
        prop_assert_eq!(Level::parse(&name), level);
    }

    /// Ordering agrees with numeric severity
    #[test]
    fn test_level_ordering_matches_severity(a in any_level(), b in any_level()) {
        prop_assert_eq!(a.cmp(&b), a.severity().cmp(&b.severity()));
        prop_assert_eq!(a == b, a.severity() == b.severity());
    }

    /// Records below the minimum level succeed without output
    #[test]
    fn test_below_min_level_is_silent(min in loggable_level(), level in loggable_level()) {
        let out = MemoryWriter::new();
        let logger = Logger::builder()
            .min_level(min)
            .writer(out.clone())
            .on_fatal(|| {})
            .build();
        let outcome = logger.log(Record::new(level, "probe")).unwrap();

        if level < min {
            prop_assert_eq!(outcome, Outcome::Skipped);
            prop_assert!(out.is_empty());
        } else {
            let expected = if level == Level::Fatal { Outcome::Fatal } else { Outcome::Written };
            prop_assert_eq!(outcome, expected);
            prop_assert!(out.text().ends_with('\n'));
        }
    }
}

// ============================================================================
// Record Tests
// ============================================================================

proptest! {
    /// Mutating a clone never leaks into the original
    #[test]
    fn test_clone_independence(
        message in "[a-z]{1,16}",
        key in "[a-z]{1,8}",
        value in field_value(),
    ) {
        let original = Record::new(Level::Info, message.clone()).tag("k", "v");
        let mut copy = original.clone();
        copy.message.push_str("-changed");
        copy.tags.insert("k".into(), "other".into());
        copy.fields.insert(key, value);

        prop_assert_eq!(&original.message, &message);
        prop_assert_eq!(original.tags.get("k").map(String::as_str), Some("v"));
        prop_assert!(original.fields.is_empty());
    }

    /// JSON output parses back into the same message, level, tags and fields
    #[test]
    fn test_json_roundtrip(
        level in loggable_level(),
        message in "[a-zA-Z0-9 ,.:-]{1,40}",
        tags in proptest::collection::btree_map("[a-z]{1,6}", "[a-z0-9]{0,6}", 0..4),
        fields in proptest::collection::btree_map("[a-z]{1,6}", field_value(), 0..4),
    ) {
        let record = Record::new(level, message.clone())
            .with_tags(tags.clone())
            .with_fields(fields.clone());
        let bytes = Formatter::from_name("json").unwrap().format(&record).unwrap();
        let parsed = Record::from_json(&bytes).unwrap();

        prop_assert_eq!(parsed.level, level);
        prop_assert_eq!(parsed.message, message);
        prop_assert_eq!(parsed.tags, tags);
        prop_assert_eq!(parsed.fields, fields);
    }

    /// The JSON formatter is a pure function of the record
    #[test]
    fn test_json_format_is_deterministic(message in "[ -~]{1,40}", n in any::<i64>()) {
        let record = Record::new(Level::Warn, message).with_field("n", n);
        let formatter = Formatter::from_name("json").unwrap();
        prop_assert_eq!(formatter.format(&record).unwrap(), formatter.format(&record).unwrap());
    }
}

// ============================================================================
// Metrics Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Concurrent increments add up regardless of interleaving
    #[test]
    fn test_increment_commutes_across_threads(
        deltas in proptest::collection::vec(proptest::collection::vec(0u32..1000, 1..20), 1..6),
    ) {
        let metrics = Arc::new(MetricsRegistry::new());
        std::thread::scope(|scope| {
            for batch in &deltas {
                let metrics = Arc::clone(&metrics);
                scope.spawn(move || {
                    for delta in batch {
                        metrics.increment("events_total", f64::from(*delta));
                    }
                });
            }
        });

        let expected: u64 = deltas.iter().flatten().map(|d| u64::from(*d)).sum();
        prop_assert_eq!(metrics.get("events_total"), Some(expected as f64));
    }
}
