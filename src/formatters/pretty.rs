use crate::core::record::Record;
use std::fmt::Write as _;

/// Multi-line rendering for humans; tag and field keys are sorted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrettyFormatter;

impl PrettyFormatter {
    pub(crate) fn format(&self, record: &Record) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} {} (sev {})",
            record.timestamp_rfc3339(),
            record.level.label(),
            record.severity
        );
        let _ = writeln!(out, "  message: {}", record.sanitized_message());

        let optional = [
            ("context", record.context.as_deref()),
            ("source", record.source.as_deref()),
            ("trace", record.trace_id.as_deref()),
            ("caller", record.caller.as_deref()),
        ];
        for (label, value) in optional {
            if let Some(value) = value {
                let _ = writeln!(out, "  {}: {}", label, value);
            }
        }

        if !record.tags.is_empty() {
            out.push_str("  tags:\n");
            for (key, value) in &record.tags {
                let _ = writeln!(out, "    {}: {}", key, value);
            }
        }
        if !record.fields.is_empty() {
            out.push_str("  fields:\n");
            for (key, value) in &record.fields {
                let _ = writeln!(out, "    {}: {}", key, value);
            }
        }
        if let Some(error) = &record.error {
            let _ = writeln!(out, "  error: {}", error.message);
            for cause in &error.chain {
                let _ = writeln!(out, "    caused by: {}", cause);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::Level;

    #[test]
    fn test_sorted_keys() {
        let record = Record::new(Level::Success, "deployed")
            .tag("zone", "b")
            .tag("app", "web")
            .with_field("version", "1.2.3")
            .with_field("attempt", 2);
        let text = PrettyFormatter.format(&record);
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].ends_with("SUCCESS (sev 25)"));
        assert_eq!(lines[1], "  message: deployed");
        assert_eq!(
            &lines[2..],
            [
                "  tags:",
                "    app: web",
                "    zone: b",
                "  fields:",
                "    attempt: 2",
                "    version: 1.2.3",
            ]
        );
        assert!(text.ends_with('\n'));
    }
}
