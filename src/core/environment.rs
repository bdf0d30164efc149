//! Process environment consulted by the formatters

use std::env;

/// Disables ANSI color regardless of record hints
pub const NO_COLOR_VAR: &str = "LOGZ_NO_COLOR";
/// Disables level icons regardless of record hints
pub const NO_ICON_VAR: &str = "LOGZ_NO_ICON";

/// Snapshot of the environment variables that affect rendering.
///
/// Captured once when a formatter is built; tests construct it directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub no_color: bool,
    pub no_icon: bool,
    pub lang: Option<String>,
}

impl Environment {
    /// Read `LOGZ_NO_COLOR`, `LOGZ_NO_ICON` and `LANG`
    pub fn capture() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            no_color: lookup(NO_COLOR_VAR).is_some_and(|v| is_truthy(&v)),
            no_icon: lookup(NO_ICON_VAR).is_some_and(|v| is_truthy(&v)),
            lang: lookup("LANG").filter(|v| !v.trim().is_empty()),
        }
    }

    /// Environment that forbids nothing and has no locale
    pub fn neutral() -> Self {
        Self::default()
    }
}

/// A set variable counts unless it spells out a false value
fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
