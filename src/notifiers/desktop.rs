use crate::core::error::{LoggerError, Result};
use crate::core::record::Record;

/// Desktop notification through the session bus
/// (`org.freedesktop.Notifications`).
///
/// Requires the `dbus` cargo feature; without it every notification fails
/// with a transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopNotifier {
    app_name: String,
    timeout_ms: i32,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self {
            app_name: "logz".to_string(),
            timeout_ms: 5000,
        }
    }
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    fn summary(record: &Record) -> String {
        match record.source.as_deref() {
            Some(source) => format!("[{}] {}", record.level.label(), source),
            None => format!("[{}]", record.level.label()),
        }
    }

    #[cfg(feature = "dbus")]
    pub(crate) fn send(&self, notifier: &str, record: &Record) -> Result<()> {
        use std::collections::HashMap;
        use zbus::zvariant::Value;

        let transport = |e: zbus::Error| LoggerError::transport(notifier, e.to_string());
        let connection = zbus::blocking::Connection::session().map_err(transport)?;
        let hints: HashMap<&str, Value<'_>> = HashMap::new();
        let summary = Self::summary(record);
        connection
            .call_method(
                Some("org.freedesktop.Notifications"),
                "/org/freedesktop/Notifications",
                Some("org.freedesktop.Notifications"),
                "Notify",
                &(
                    self.app_name.as_str(),
                    0u32,
                    "",
                    summary.as_str(),
                    record.message.as_str(),
                    Vec::<&str>::new(),
                    hints,
                    self.timeout_ms,
                ),
            )
            .map_err(transport)?;
        Ok(())
    }

    #[cfg(not(feature = "dbus"))]
    pub(crate) fn send(&self, notifier: &str, record: &Record) -> Result<()> {
        let _ = Self::summary(record);
        Err(LoggerError::transport(
            notifier,
            "desktop notifications require the `dbus` feature",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::Level;

    #[test]
    fn test_summary() {
        let record = Record::new(Level::Alert, "x").with_source("cron");
        assert_eq!(DesktopNotifier::summary(&record), "[ALERT] cron");
        assert_eq!(
            DesktopNotifier::summary(&Record::new(Level::Info, "x")),
            "[INFO]"
        );
    }

    #[cfg(not(feature = "dbus"))]
    #[test]
    fn test_without_bus_support() {
        let err = DesktopNotifier::new()
            .send("desk", &Record::new(Level::Info, "x"))
            .unwrap_err();
        assert!(err.is_notifier_failure());
    }
}
