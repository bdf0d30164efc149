use crate::core::error::{LoggerError, Result};
use crate::core::record::Record;

/// One YAML document per record, each opened with `---`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YamlFormatter;

impl YamlFormatter {
    pub(crate) fn format(&self, record: &Record) -> Result<Vec<u8>> {
        let body = serde_yaml::to_string(&record.wire())
            .map_err(|e| LoggerError::format_failed("yaml", e.to_string()))?;
        let mut out = String::with_capacity(body.len() + 4);
        out.push_str("---\n");
        out.push_str(&body);
        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::Level;

    #[test]
    fn test_document_parses_back() {
        let record = Record::new(Level::Alert, "queue: backlog")
            .tag("region", "eu")
            .with_field("depth", 1200);
        let bytes = YamlFormatter.format(&record).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("---\n"));

        let value: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
        assert_eq!(value["level"].as_str(), Some("alert"));
        assert_eq!(value["msg"].as_str(), Some("queue: backlog"));
        assert_eq!(value["sev"].as_i64(), Some(35));
        assert_eq!(value["tags"]["region"].as_str(), Some("eu"));
        assert_eq!(value["fields"]["depth"].as_i64(), Some(1200));
    }

    #[test]
    fn test_empty_maps_are_omitted() {
        let text =
            String::from_utf8(YamlFormatter.format(&Record::new(Level::Info, "x")).unwrap()).unwrap();
        assert!(!text.contains("tags"));
        assert!(!text.contains("fields"));
    }
}
