use crate::core::error::Result;
use crate::core::record::Record;
use std::borrow::Cow;

/// One RFC 4180 row per record.
///
/// Tags and fields are embedded as JSON strings. The formatter writes no
/// header; use [`CsvFormatter::header`] when the destination needs one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CsvFormatter;

impl CsvFormatter {
    pub const COLUMNS: [&'static str; 11] = [
        "ts", "level", "sev", "msg", "ctx", "src", "trace", "caller", "tags", "fields", "error",
    ];

    pub fn header() -> String {
        Self::COLUMNS.join(",")
    }

    pub(crate) fn format(&self, record: &Record) -> Result<Vec<u8>> {
        let tags = if record.tags.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&record.tags)?
        };
        let fields = if record.fields.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&record.fields)?
        };
        let columns = [
            record.timestamp_rfc3339(),
            record.level.to_str().to_string(),
            record.severity.to_string(),
            record.message.clone(),
            record.context.clone().unwrap_or_default(),
            record.source.clone().unwrap_or_default(),
            record.trace_id.clone().unwrap_or_default(),
            record.caller.clone().unwrap_or_default(),
            tags,
            fields,
            record
                .error
                .as_ref()
                .map(|e| e.message.clone())
                .unwrap_or_default(),
        ];
        let row = columns
            .iter()
            .map(|c| quote(c))
            .collect::<Vec<_>>()
            .join(",");
        Ok(row.into_bytes())
    }
}

fn quote(value: &str) -> Cow<'_, str> {
    if value.contains(|c| matches!(c, ',' | '"' | '\n' | '\r')) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
