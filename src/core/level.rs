//! Log level definitions

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Severity scale of a record.
///
/// The discriminant is the numeric severity. Ordering compares severities
/// and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
    Silent = 0,
    Answer = 1,
    Trace = 5,
    Notice = 10,
    Debug = 15,
    #[default]
    Info = 20,
    Success = 25,
    Warn = 30,
    Alert = 35,
    Error = 40,
    Critical = 45,
    Fatal = 50,
    Bug = 60,
    Panic = 70,
}

impl Level {
    pub const ALL: [Level; 14] = [
        Level::Silent,
        Level::Answer,
        Level::Trace,
        Level::Notice,
        Level::Debug,
        Level::Info,
        Level::Success,
        Level::Warn,
        Level::Alert,
        Level::Error,
        Level::Critical,
        Level::Fatal,
        Level::Bug,
        Level::Panic,
    ];

    #[inline]
    pub const fn severity(self) -> i32 {
        self as i32
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Level::Silent => "silent",
            Level::Answer => "answer",
            Level::Trace => "trace",
            Level::Notice => "notice",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Success => "success",
            Level::Warn => "warn",
            Level::Alert => "alert",
            Level::Error => "error",
            Level::Critical => "critical",
            Level::Fatal => "fatal",
            Level::Bug => "bug",
            Level::Panic => "panic",
        }
    }

    /// Upper-case label used by text-oriented formatters
    pub fn label(&self) -> String {
        self.to_str().to_ascii_uppercase()
    }

    /// Parse a level name, case-insensitively. Unknown names map to `Silent`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "answer" => Level::Answer,
            "trace" => Level::Trace,
            "notice" => Level::Notice,
            "debug" => Level::Debug,
            "info" => Level::Info,
            "success" => Level::Success,
            "warn" | "warning" => Level::Warn,
            "alert" => Level::Alert,
            "error" | "err" => Level::Error,
            "critical" | "crit" => Level::Critical,
            "fatal" => Level::Fatal,
            "bug" => Level::Bug,
            "panic" => Level::Panic,
            _ => Level::Silent,
        }
    }

    /// Level whose severity is exactly `severity`, if any
    pub fn from_severity(severity: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.severity() == severity)
    }

    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            Level::Silent => White,
            Level::Answer => Cyan,
            Level::Trace => BrightBlack,
            Level::Notice => BrightBlue,
            Level::Debug => Blue,
            Level::Info => Green,
            Level::Success => BrightGreen,
            Level::Warn => Yellow,
            Level::Alert => BrightYellow,
            Level::Error => Red,
            Level::Critical => BrightRed,
            Level::Fatal => Magenta,
            Level::Bug => BrightMagenta,
            Level::Panic => BrightRed,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Level::Silent => "",
            Level::Answer => "💬",
            Level::Trace => "🔍",
            Level::Notice => "📝",
            Level::Debug => "🐛",
            Level::Info => "ℹ️",
            Level::Success => "✅",
            Level::Warn => "⚠️",
            Level::Alert => "🚨",
            Level::Error => "❌",
            Level::Critical => "🔥",
            Level::Fatal => "💀",
            Level::Bug => "🐞",
            Level::Panic => "😱",
        }
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for Level {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Level::parse(s))
    }
}

impl From<&str> for Level {
    fn from(s: &str) -> Self {
        Level::parse(s)
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.to_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Level::parse(&s))
    }
}
