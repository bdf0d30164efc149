//! Record formatters
//!
//! Each formatter maps a validated record to bytes. Formatters are pure:
//! the trailing newline is the pipeline's concern, not theirs.

mod csv;
mod json;
mod minimal;
mod pretty;
mod text;
mod xml;
mod yaml;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::minimal::MinimalFormatter;
pub use self::pretty::PrettyFormatter;
pub use self::text::TextFormatter;
pub use self::xml::XmlFormatter;
pub use self::yaml::YamlFormatter;

use crate::core::error::{LoggerError, Result};
use crate::core::record::Record;

/// Formatter selected by name in configuration
#[derive(Debug, Clone)]
pub enum Formatter {
    Json(JsonFormatter),
    Text(TextFormatter),
    Yaml(YamlFormatter),
    Xml(XmlFormatter),
    Csv(CsvFormatter),
    Pretty(PrettyFormatter),
    Minimal(MinimalFormatter),
}

impl Default for Formatter {
    fn default() -> Self {
        Formatter::Text(TextFormatter::new())
    }
}

impl Formatter {
    pub const NAMES: [&'static str; 7] = ["json", "text", "yaml", "xml", "csv", "pretty", "minimal"];

    /// Build the default variant for a configuration name
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Formatter::Json(JsonFormatter::new())),
            "text" => Ok(Formatter::Text(TextFormatter::new())),
            "yaml" => Ok(Formatter::Yaml(YamlFormatter)),
            "xml" => Ok(Formatter::Xml(XmlFormatter)),
            "csv" => Ok(Formatter::Csv(CsvFormatter)),
            "pretty" => Ok(Formatter::Pretty(PrettyFormatter)),
            "minimal" => Ok(Formatter::Minimal(MinimalFormatter)),
            other => Err(LoggerError::config(
                "formatter",
                format!("unknown formatter '{}', expected one of {:?}", other, Self::NAMES),
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Formatter::Json(_) => "json",
            Formatter::Text(_) => "text",
            Formatter::Yaml(_) => "yaml",
            Formatter::Xml(_) => "xml",
            Formatter::Csv(_) => "csv",
            Formatter::Pretty(_) => "pretty",
            Formatter::Minimal(_) => "minimal",
        }
    }

    /// Serialize a record; a record failing validation produces no bytes
    pub fn format(&self, record: &Record) -> Result<Vec<u8>> {
        record.validate()?;
        match self {
            Formatter::Json(f) => f.format(record),
            Formatter::Text(f) => Ok(f.format(record).into_bytes()),
            Formatter::Yaml(f) => f.format(record),
            Formatter::Xml(f) => Ok(f.format(record).into_bytes()),
            Formatter::Csv(f) => f.format(record),
            Formatter::Pretty(f) => Ok(f.format(record).into_bytes()),
            Formatter::Minimal(f) => Ok(f.format(record).into_bytes()),
        }
    }
}

impl From<JsonFormatter> for Formatter {
    fn from(f: JsonFormatter) -> Self {
        Formatter::Json(f)
    }
}

impl From<TextFormatter> for Formatter {
    fn from(f: TextFormatter) -> Self {
        Formatter::Text(f)
    }
}
