use crate::core::record::Record;

/// `LEVEL message\n`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinimalFormatter;

impl MinimalFormatter {
    pub(crate) fn format(&self, record: &Record) -> String {
        format!("{} {}\n", record.level.label(), record.sanitized_message())
    }
}
