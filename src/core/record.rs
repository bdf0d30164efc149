//! Log record structure

use super::error::{LoggerError, Result};
use super::field::FieldValue;
use super::level::Level;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Rendering hints a record carries to formatters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayHints {
    pub show_color: bool,
    pub show_icon: bool,
    pub show_trace_id: bool,
    pub show_caller: bool,
    pub show_stack: bool,
    pub show_fields: bool,
    pub show_tags: bool,
}

impl Default for DisplayHints {
    fn default() -> Self {
        Self {
            show_color: false,
            show_icon: false,
            show_trace_id: true,
            show_caller: false,
            show_stack: false,
            show_fields: true,
            show_tags: true,
        }
    }
}

/// Failure attached to a record.
///
/// Only the rendered message and the `source()` chain are kept, so records
/// stay cloneable and serializable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chain: Vec<String>,
}

impl RecordError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            chain: Vec::new(),
        }
    }

    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: err.to_string(),
            chain,
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A structured log entry.
///
/// Builders consume and return the record, so a record handed to a
/// [`Logger`](crate::Logger) is never aliased by its producer.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    /// Cached `level.severity()`; checked by [`Record::validate`]
    pub severity: i32,
    pub message: String,
    pub context: Option<String>,
    pub source: Option<String>,
    pub trace_id: Option<String>,
    pub caller: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub error: Option<RecordError>,
    pub hints: DisplayHints,
}

impl Record {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            severity: level.severity(),
            message: message.into(),
            context: None,
            source: None,
            trace_id: None,
            caller: None,
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            error: None,
            hints: DisplayHints::default(),
        }
    }

    /// Construct from a level name; an empty name is `InvalidLevel`
    pub fn named(level: &str, message: impl Into<String>) -> Result<Self> {
        if level.trim().is_empty() {
            return Err(LoggerError::InvalidLevel);
        }
        Ok(Self::new(Level::parse(level), message))
    }

    /// Check the record invariants before any bytes are produced
    pub fn validate(&self) -> Result<()> {
        if self.message.is_empty() {
            return Err(LoggerError::MissingMessage);
        }
        if self.severity != self.level.severity()
            || (self.level != Level::Silent && self.severity <= 0)
        {
            return Err(LoggerError::invalid_severity(
                self.level.to_str(),
                self.severity,
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self.severity = level.severity();
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    #[must_use]
    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    /// Record the call site of this builder as the caller
    #[must_use]
    #[track_caller]
    pub fn located(mut self) -> Self {
        let location = std::panic::Location::caller();
        self.caller = Some(format!("{}:{}", location.file(), location.line()));
        self
    }

    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_tags<K, V, I>(mut self, tags: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.tags
            .extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_fields<K, V, I>(mut self, fields: I) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.fields
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub fn with_error(mut self, err: &(dyn std::error::Error + 'static)) -> Self {
        self.error = Some(RecordError::from_error(err));
        self
    }

    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error = Some(RecordError::new(message));
        self
    }

    #[must_use]
    pub fn with_hints(mut self, hints: DisplayHints) -> Self {
        self.hints = hints;
        self
    }

    #[must_use]
    pub fn show_color(mut self, on: bool) -> Self {
        self.hints.show_color = on;
        self
    }

    #[must_use]
    pub fn show_icon(mut self, on: bool) -> Self {
        self.hints.show_icon = on;
        self
    }

    #[must_use]
    pub fn show_trace_id(mut self, on: bool) -> Self {
        self.hints.show_trace_id = on;
        self
    }

    #[must_use]
    pub fn show_caller(mut self, on: bool) -> Self {
        self.hints.show_caller = on;
        self
    }

    #[must_use]
    pub fn show_stack(mut self, on: bool) -> Self {
        self.hints.show_stack = on;
        self
    }

    #[must_use]
    pub fn show_fields(mut self, on: bool) -> Self {
        self.hints.show_fields = on;
        self
    }

    #[must_use]
    pub fn show_tags(mut self, on: bool) -> Self {
        self.hints.show_tags = on;
        self
    }

    /// Message with line breaks and tabs escaped, for line-oriented output
    pub fn sanitized_message(&self) -> Cow<'_, str> {
        sanitize(&self.message)
    }

    /// Timestamp as RFC 3339 with nanosecond precision
    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    pub(crate) fn wire(&self) -> WireRecord<'_> {
        WireRecord {
            ts: self.timestamp_rfc3339(),
            level: self.level.to_str(),
            msg: &self.message,
            ctx: self.context.as_deref(),
            src: self.source.as_deref(),
            trace: self.trace_id.as_deref(),
            caller: self.caller.as_deref(),
            sev: self.severity,
            tags: &self.tags,
            fields: &self.fields,
            error: self.error.as_ref().map(|e| e.message.as_str()),
        }
    }

    /// Parse a record back from the JSON formatter's output
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let wire: OwnedWireRecord = serde_json::from_slice(bytes)?;
        let level_name = wire.level.unwrap_or_default();
        if level_name.trim().is_empty() {
            return Err(LoggerError::InvalidLevel);
        }
        let level = Level::parse(&level_name);
        let timestamp = wire
            .ts
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Ok(Self {
            timestamp,
            level,
            severity: wire.sev.unwrap_or_else(|| level.severity()),
            message: wire.msg,
            context: wire.ctx,
            source: wire.src,
            trace_id: wire.trace,
            caller: wire.caller,
            tags: wire.tags,
            fields: wire.fields,
            error: wire.error.map(RecordError::new),
            hints: DisplayHints::default(),
        })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.level,
            self.message
        )
    }
}

/// Escape line breaks and tabs so one record stays on one line
pub(crate) fn sanitize(message: &str) -> Cow<'_, str> {
    if message.contains(|c| matches!(c, '\n' | '\r' | '\t')) {
        Cow::Owned(
            message
                .replace('\n', "\\n")
                .replace('\r', "\\r")
                .replace('\t', "\\t"),
        )
    } else {
        Cow::Borrowed(message)
    }
}

fn is_empty_map<K, V>(map: &&BTreeMap<K, V>) -> bool {
    map.is_empty()
}

/// Borrowed serialization view with the stable wire key names
#[derive(Debug, Serialize)]
pub(crate) struct WireRecord<'a> {
    pub ts: String,
    pub level: &'static str,
    pub msg: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctx: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<&'a str>,
    pub sev: i32,
    #[serde(skip_serializing_if = "is_empty_map")]
    pub tags: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "is_empty_map")]
    pub fields: &'a BTreeMap<String, FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct OwnedWireRecord {
    ts: Option<String>,
    level: Option<String>,
    #[serde(default)]
    msg: String,
    ctx: Option<String>,
    src: Option<String>,
    trace: Option<String>,
    caller: Option<String>,
    sev: Option<i32>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    #[serde(default)]
    fields: BTreeMap<String, FieldValue>,
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_caches_severity() {
        let record = Record::new(Level::Warn, "disk almost full");
        assert_eq!(record.severity, 30);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_named_rejects_empty_level() {
        assert!(matches!(
            Record::named("", "x"),
            Err(LoggerError::InvalidLevel)
        ));
        assert_eq!(Record::named("ERROR", "x").unwrap().level, Level::Error);
    }

    #[test]
    fn test_validate_missing_message() {
        let record = Record::new(Level::Info, "");
        assert!(matches!(record.validate(), Err(LoggerError::MissingMessage)));
    }

    #[test]
    fn test_validate_severity_mismatch() {
        let mut record = Record::new(Level::Info, "x");
        record.severity = 0;
        assert!(matches!(
            record.validate(),
            Err(LoggerError::InvalidSeverity { .. })
        ));

        let record = Record::new(Level::Silent, "quiet");
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_with_level_keeps_severity_in_sync() {
        let record = Record::new(Level::Info, "x").with_level(Level::Critical);
        assert_eq!(record.severity, Level::Critical.severity());
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Record::new(Level::Info, "x")
            .tag("env", "prod")
            .with_field("n", 1);
        let copy = original.clone().tag("env", "dev").with_field("m", 2);

        assert_eq!(original.tags["env"], "prod");
        assert!(!original.fields.contains_key("m"));
        assert_eq!(copy.tags["env"], "dev");
    }

    #[test]
    fn test_display_format() {
        let ts = DateTime::parse_from_rfc3339("2025-01-08T10:30:45Z")
            .unwrap()
            .with_timezone(&Utc);
        let record = Record::new(Level::Info, "hello").with_timestamp(ts);
        assert_eq!(record.to_string(), "2025-01-08T10:30:45Z [info] hello");
    }

    #[test]
    fn test_error_chain_is_captured() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "inner cause");
        let outer = LoggerError::io_operation("opening", "cannot open", inner);
        let record = Record::new(Level::Error, "failed").with_error(&outer);
        let error = record.error.unwrap();
        assert!(error.message.contains("cannot open"));
        assert_eq!(error.chain, vec!["inner cause".to_string()]);
    }

    #[test]
    fn test_located_sets_caller() {
        let record = Record::new(Level::Info, "x").located();
        assert!(record.caller.unwrap().contains("record.rs"));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("a\nb\tc"), "a\\nb\\tc");
        assert!(matches!(sanitize("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_from_json_requires_level() {
        let err = Record::from_json(br#"{"msg":"x"}"#).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidLevel));
    }

    #[test]
    fn test_from_json_reads_wire_keys() {
        let record = Record::from_json(
            br#"{"ts":"2025-01-08T10:30:45Z","level":"warn","msg":"hi","src":"api","sev":30,"tags":{"a":"b"},"fields":{"n":1}}"#,
        )
        .unwrap();
        assert_eq!(record.level, Level::Warn);
        assert_eq!(record.message, "hi");
        assert_eq!(record.source.as_deref(), Some("api"));
        assert_eq!(record.tags["a"], "b");
        assert_eq!(record.fields["n"], FieldValue::Int(1));
    }
}
