use crate::core::environment::Environment;
use crate::core::record::Record;
use crate::core::timestamp::TimestampFormat;
use colored::Color;
use serde_json::{Map, Value};

/// Human-readable line: `[ts] [LEVEL] (ctx) icon msg meta`.
///
/// Color and icons follow the record hints unless forced by configuration,
/// and are always suppressed when the captured environment forbids them.
/// `meta` is a JSON object holding the tags, fields, trace id, caller and
/// error chain selected by the record hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFormatter {
    pub timestamp: TimestampFormat,
    pub environment: Environment,
    /// Overrides `hints.show_color` when set
    pub force_color: Option<bool>,
    /// Overrides `hints.show_icon` when set
    pub force_icons: Option<bool>,
    /// Print `meta` indented on the lines following the record
    pub multiline_meta: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextFormatter {
    /// Capture the process environment; the timestamp style follows `LANG`
    pub fn new() -> Self {
        Self::with_environment(Environment::capture())
    }

    pub fn with_environment(environment: Environment) -> Self {
        Self {
            timestamp: TimestampFormat::from_lang(environment.lang.as_deref()),
            environment,
            force_color: None,
            force_icons: None,
            multiline_meta: false,
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: TimestampFormat) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn force_color(mut self, on: bool) -> Self {
        self.force_color = Some(on);
        self
    }

    #[must_use]
    pub fn force_icons(mut self, on: bool) -> Self {
        self.force_icons = Some(on);
        self
    }

    #[must_use]
    pub fn multiline_meta(mut self, on: bool) -> Self {
        self.multiline_meta = on;
        self
    }

    fn color_enabled(&self, record: &Record) -> bool {
        !self.environment.no_color && self.force_color.unwrap_or(record.hints.show_color)
    }

    fn icon_enabled(&self, record: &Record) -> bool {
        !self.environment.no_icon && self.force_icons.unwrap_or(record.hints.show_icon)
    }

    pub(crate) fn format(&self, record: &Record) -> String {
        let mut line = format!("[{}] ", self.timestamp.format(&record.timestamp));

        let label = record.level.label();
        if self.color_enabled(record) {
            line.push_str(&paint(&format!("[{}]", label), record.level.color_code()));
        } else {
            line.push('[');
            line.push_str(&label);
            line.push(']');
        }

        if let Some(ctx) = record.context.as_deref().filter(|c| !c.is_empty()) {
            line.push_str(" (");
            line.push_str(ctx);
            line.push(')');
        }

        let icon = record.level.icon();
        if self.icon_enabled(record) && !icon.is_empty() {
            line.push(' ');
            line.push_str(icon);
        }

        line.push(' ');
        line.push_str(&record.sanitized_message());

        let meta = meta(record);
        if !meta.is_empty() {
            let meta = Value::Object(meta);
            if self.multiline_meta {
                let pretty = serde_json::to_string_pretty(&meta).unwrap_or_default();
                for meta_line in pretty.lines() {
                    line.push_str("\n    ");
                    line.push_str(meta_line);
                }
            } else {
                line.push(' ');
                line.push_str(&meta.to_string());
            }
        }

        line
    }
}

// Colorize::color would consult colored's own tty and CLICOLOR detection and
// override the per-record decision, so only its escape codes are used here.
fn paint(text: &str, color: Color) -> String {
    format!("\x1b[{}m{}\x1b[0m", color.to_fg_str(), text)
}

fn meta(record: &Record) -> Map<String, Value> {
    let hints = &record.hints;
    let mut meta = Map::new();

    if let Some(src) = record.source.as_deref() {
        meta.insert("src".into(), Value::String(src.to_string()));
    }
    if hints.show_trace_id {
        if let Some(trace) = record.trace_id.as_deref() {
            meta.insert("trace".into(), Value::String(trace.to_string()));
        }
    }
    if hints.show_caller {
        if let Some(caller) = record.caller.as_deref() {
            meta.insert("caller".into(), Value::String(caller.to_string()));
        }
    }
    if hints.show_tags && !record.tags.is_empty() {
        let tags = record
            .tags
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        meta.insert("tags".into(), Value::Object(tags));
    }
    if hints.show_fields && !record.fields.is_empty() {
        let fields = record
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json_value()))
            .collect();
        meta.insert("fields".into(), Value::Object(fields));
    }
    if let Some(error) = &record.error {
        meta.insert("error".into(), Value::String(error.message.clone()));
        if hints.show_stack && !error.chain.is_empty() {
            let chain = error.chain.iter().cloned().map(Value::String).collect();
            meta.insert("stack".into(), Value::Array(chain));
        }
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::Level;
    use chrono::{DateTime, Utc};

    fn formatter() -> TextFormatter {
        TextFormatter::with_environment(Environment::neutral())
    }

    fn record(level: Level, message: &str) -> Record {
        let ts = DateTime::parse_from_rfc3339("2025-01-08T10:30:45Z")
            .unwrap()
            .with_timezone(&Utc);
        Record::new(level, message).with_timestamp(ts)
    }

    #[test]
    fn test_plain_line() {
        let line = formatter().format(&record(Level::Info, "hello"));
        assert_eq!(line, "[2025-01-08T10:30:45Z] [INFO] hello");
    }

    #[test]
    fn test_context_icon_and_meta() {
        let r = record(Level::Warn, "disk")
            .with_context("worker-1")
            .show_icon(true)
            .tag("host", "a")
            .with_field("pct", 91);
        let line = formatter().format(&r);
        assert!(line.starts_with("[2025-01-08T10:30:45Z] [WARN] (worker-1) ⚠️ disk {"));
        assert!(line.contains("\"tags\":{\"host\":\"a\"}"));
        assert!(line.contains("\"fields\":{\"pct\":91}"));
    }

    #[test]
    fn test_hidden_tags_and_fields() {
        let r = record(Level::Info, "x")
            .tag("a", "b")
            .with_field("n", 1)
            .show_tags(false)
            .show_fields(false);
        assert_eq!(formatter().format(&r), "[2025-01-08T10:30:45Z] [INFO] x");
    }

    #[test]
    fn test_color_follows_hint() {
        let r = record(Level::Error, "boom").show_color(true);
        let line = formatter().format(&r);
        assert!(line.contains("\x1b[31m[ERROR]\x1b[0m"), "{:?}", line);
    }

    #[test]
    fn test_environment_forbids_color_and_icons() {
        let env = Environment {
            no_color: true,
            no_icon: true,
            lang: None,
        };
        let r = record(Level::Error, "boom").show_color(true).show_icon(true);
        let line = TextFormatter::with_environment(env).format(&r);
        assert!(!line.contains('\x1b'));
        assert!(!line.contains(Level::Error.icon()));
    }

    #[test]
    fn test_forced_color_overrides_hint() {
        let r = record(Level::Info, "x");
        let line = formatter().force_color(true).format(&r);
        assert!(line.contains('\x1b'));
        let r = record(Level::Info, "x").show_color(true);
        assert!(!formatter().force_color(false).format(&r).contains('\x1b'));
    }

    #[test]
    fn test_message_is_escaped() {
        let line = formatter().format(&record(Level::Info, "a\nFAKE [ERROR] b"));
        assert_eq!(line.lines().count(), 1);
        assert!(line.contains("a\\nFAKE"));
    }

    #[test]
    fn test_localized_timestamp() {
        let env = Environment {
            lang: Some("de_DE.UTF-8".into()),
            ..Environment::default()
        };
        let line = TextFormatter::with_environment(env).format(&record(Level::Info, "x"));
        assert!(line.starts_with("[08.01.2025 10:30:45]"), "{}", line);
    }

    #[test]
    fn test_trace_caller_and_stack() {
        let r = record(Level::Error, "x")
            .with_trace_id("t-9")
            .with_caller("main.rs:3")
            .show_caller(true)
            .show_stack(true)
            .with_error(&crate::core::error::LoggerError::io_operation(
                "reading",
                "cannot read",
                std::io::Error::new(std::io::ErrorKind::Other, "eof"),
            ));
        let line = formatter().format(&r);
        assert!(line.contains("\"trace\":\"t-9\""));
        assert!(line.contains("\"caller\":\"main.rs:3\""));
        assert!(line.contains("\"stack\":[\"eof\"]"));
    }

    #[test]
    fn test_multiline_meta() {
        let r = record(Level::Info, "x").with_field("n", 1);
        let text = formatter().multiline_meta(true).format(&r);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[2025-01-08T10:30:45Z] [INFO] x");
        assert!(lines[1].starts_with("    {"));
    }
}
