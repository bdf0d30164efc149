use crate::core::error::{LoggerError, Result};
use crate::core::record::Record;

/// Canonical JSON object with keys
/// `ts, level, msg, ctx, src, trace, caller, sev, tags, fields, error`.
///
/// Absent or empty values are omitted. Map keys are sorted, so repeated
/// calls on an untouched record are byte-identical.
///
/// ```
/// use logz::{Formatter, JsonFormatter, Level, Record};
///
/// let record = Record::new(Level::Info, "hello").with_field("n", 1);
/// let bytes = Formatter::from(JsonFormatter::new()).format(&record).unwrap();
/// let text = String::from_utf8(bytes).unwrap();
/// assert!(text.ends_with(r#""msg":"hello","sev":20,"fields":{"n":1}}"#));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonFormatter {
    /// Two-space indented output
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub(crate) fn format(&self, record: &Record) -> Result<Vec<u8>> {
        let wire = record.wire();
        let result = if self.pretty {
            serde_json::to_vec_pretty(&wire)
        } else {
            serde_json::to_vec(&wire)
        };
        result.map_err(|e| LoggerError::format_failed("json", e.to_string()))
    }
}
