use crate::core::record::Record;
use std::borrow::Cow;

/// Single-element XML rendering.
///
/// Tags and fields are not emitted: arbitrary maps have no unambiguous
/// XML shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XmlFormatter;

impl XmlFormatter {
    pub(crate) fn format(&self, record: &Record) -> String {
        let mut out = String::from("<record>");
        element(&mut out, "ts", &record.timestamp_rfc3339());
        element(&mut out, "level", record.level.to_str());
        element(&mut out, "msg", &record.message);
        let optional = [
            ("ctx", record.context.as_deref()),
            ("src", record.source.as_deref()),
            ("trace", record.trace_id.as_deref()),
            ("caller", record.caller.as_deref()),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                element(&mut out, name, value);
            }
        }
        element(&mut out, "sev", &record.severity.to_string());
        if let Some(error) = &record.error {
            element(&mut out, "error", &error.message);
        }
        out.push_str("</record>");
        out
    }
}

fn element(out: &mut String, name: &str, value: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
    out.push_str(&escape(value));
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

// XML 1.0 has no representation for the other C0 controls, not even as
// character references; they become U+FFFD.
fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(|c: char| matches!(c, '<' | '>' | '&' | '"' | '\'') || c < '\u{20}') {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            c if c < '\u{20}' => escaped.push(char::REPLACEMENT_CHARACTER),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::Level;
    use chrono::{DateTime, Utc};

    #[test]
    fn test_structure() {
        let ts = DateTime::parse_from_rfc3339("2025-01-08T10:30:45Z")
            .unwrap()
            .with_timezone(&Utc);
        let record = Record::new(Level::Info, "hello")
            .with_timestamp(ts)
            .with_source("api")
            .tag("ignored", "yes")
            .with_field("ignored", 1);
        assert_eq!(
            XmlFormatter.format(&record),
            "<record><ts>2025-01-08T10:30:45.000000000Z</ts><level>info</level><msg>hello</msg><src>api</src><sev>20</sev></record>"
        );
    }

    #[test]
    fn test_escaping() {
        let record = Record::new(Level::Info, "<a href=\"x\">&</a>\nnext");
        let xml = XmlFormatter.format(&record);
        assert!(xml.contains("<msg>&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;&#10;next</msg>"));
        assert!(!xml.contains('\n'));
    }

    #[test]
    fn test_forbidden_controls_are_replaced() {
        let record = Record::new(Level::Warn, "bell\u{7}nul\u{0}esc\u{1b}tab\t").with_source("a\u{1f}b");
        let xml = XmlFormatter.format(&record);
        assert!(xml.contains("<msg>bell\u{fffd}nul\u{fffd}esc\u{fffd}tab&#9;</msg>"), "{:?}", xml);
        assert!(xml.contains("<src>a\u{fffd}b</src>"));
        assert!(!xml.chars().any(|c| c < '\u{20}'));
    }
}
