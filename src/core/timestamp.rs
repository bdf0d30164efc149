//! Timestamp rendering for text-oriented formatters

use chrono::{DateTime, SecondsFormat, Utc};

/// Timestamp style used by the text and pretty formatters
///
/// # Examples
///
/// ```
/// use logz::TimestampFormat;
/// use chrono::Utc;
///
/// let format = TimestampFormat::Iso8601;
/// assert!(format.format(&Utc::now()).ends_with('Z'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `2025-01-08T10:30:45Z`
    #[default]
    Rfc3339,

    /// `2025-01-08T10:30:45.123Z`
    Iso8601,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Date order and clock taken from a `LANG` value such as `de_DE.UTF-8`
    Localized(String),

    /// Any strftime-compatible pattern
    Custom(String),
}

impl TimestampFormat {
    /// Pick the localized format when `LANG` names a locale, RFC 3339 otherwise
    pub fn from_lang(lang: Option<&str>) -> Self {
        match lang {
            Some(lang) if !is_neutral_locale(lang) => TimestampFormat::Localized(lang.to_string()),
            _ => TimestampFormat::Rfc3339,
        }
    }

    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Rfc3339 => datetime.to_rfc3339_opts(SecondsFormat::Secs, true),
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Localized(lang) => datetime.format(locale_pattern(lang)).to_string(),
            TimestampFormat::Custom(pattern) => datetime.format(pattern).to_string(),
        }
    }
}

fn is_neutral_locale(lang: &str) -> bool {
    let lang = lang.trim();
    lang.is_empty() || lang == "C" || lang.starts_with("C.") || lang == "POSIX"
}

fn locale_pattern(lang: &str) -> &'static str {
    let base = lang.split(['.', '@']).next().unwrap_or_default();
    let language = base.split(['_', '-']).next().unwrap_or_default();
    match (language, base) {
        ("en", "en_US") => "%m/%d/%Y %I:%M:%S %p",
        ("en", _) => "%d/%m/%Y %H:%M:%S",
        ("de" | "ru" | "pl" | "cs" | "fi" | "nb" | "da", _) => "%d.%m.%Y %H:%M:%S",
        ("fr" | "es" | "it" | "pt" | "el" | "tr", _) => "%d/%m/%Y %H:%M:%S",
        ("nl", _) => "%d-%m-%Y %H:%M:%S",
        ("ja" | "zh" | "ko" | "hu", _) => "%Y/%m/%d %H:%M:%S",
        ("sv" | "lt", _) => "%Y-%m-%d %H:%M:%S",
        _ => "%Y-%m-%d %H:%M:%S",
    }
}
