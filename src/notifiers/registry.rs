use super::{Notifier, NotifierConfig};
use crate::core::error::{LoggerError, Result};
use crate::core::record::Record;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Ordered `name -> config` description, as found in configuration files
pub type NotifierDescription = IndexMap<String, NotifierConfig>;

static GLOBAL: Lazy<Arc<NotifierRegistry>> = Lazy::new(|| Arc::new(NotifierRegistry::new()));

/// Thread-safe `name -> notifier` mapping.
///
/// Readers take a snapshot of the entries and deliver without holding the
/// lock, so slow remote ends never block `add`/`remove`.
///
/// # Example
///
/// ```
/// use logz::notifiers::{NotifierConfig, NotifierDescription, NotifierRegistry};
///
/// let registry = NotifierRegistry::new();
/// let mut description = NotifierDescription::new();
/// description.insert("ops".into(), NotifierConfig::http("https://hooks.example.com/ops"));
/// description.insert("desk".into(), NotifierConfig::dbus());
/// registry.update_from_config(&description);
/// assert_eq!(registry.list(), vec!["desk", "ops"]);
/// ```
#[derive(Debug, Default)]
pub struct NotifierRegistry {
    notifiers: RwLock<BTreeMap<String, Arc<Notifier>>>,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry shared by loggers that are not given their own
    pub fn global() -> Arc<NotifierRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Insert or replace
    pub fn add(&self, name: impl Into<String>, notifier: Notifier) {
        self.notifiers.write().insert(name.into(), Arc::new(notifier));
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Notifier>> {
        self.notifiers.write().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Notifier>> {
        self.notifiers.read().get(name).cloned()
    }

    /// Registered names, sorted
    pub fn list(&self) -> Vec<String> {
        self.notifiers.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.notifiers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.read().is_empty()
    }

    pub fn clear(&self) {
        self.notifiers.write().clear();
    }

    /// Converge to exactly the entries of `description`.
    ///
    /// Missing entries are created, existing ones replaced, and names absent
    /// from the description removed. Entries that cannot be built (unknown
    /// type, missing URL) are reported on stderr and left out. Returns the
    /// errors of the skipped entries.
    pub fn update_from_config(&self, description: &NotifierDescription) -> Vec<LoggerError> {
        let mut built = BTreeMap::new();
        let mut skipped = Vec::new();
        for (name, config) in description {
            match Notifier::from_config(name.clone(), config) {
                Ok(notifier) => {
                    built.insert(name.clone(), Arc::new(notifier));
                }
                Err(e) => {
                    eprintln!("[LOGGER WARNING] Skipping notifier '{}': {}", name, e);
                    skipped.push(e);
                }
            }
        }
        *self.notifiers.write() = built;
        skipped
    }

    /// Configuration of every entry that was built from one
    pub fn describe(&self) -> BTreeMap<String, NotifierConfig> {
        self.notifiers
            .read()
            .iter()
            .filter_map(|(name, n)| n.config().map(|c| (name.clone(), c.clone())))
            .collect()
    }

    /// Deliver to every notifier; returns the failures by notifier name
    pub fn notify_all(&self, record: &Record) -> Vec<(String, LoggerError)> {
        let snapshot: Vec<Arc<Notifier>> = self.notifiers.read().values().cloned().collect();
        snapshot
            .iter()
            .filter_map(|notifier| {
                notifier
                    .notify(record)
                    .err()
                    .map(|e| (notifier.name().to_string(), e))
            })
            .collect()
    }

    /// Like [`notify_all`](Self::notify_all) but fails on the first error
    pub fn try_notify_all(&self, record: &Record) -> Result<()> {
        match self.notify_all(record).into_iter().next() {
            Some((_, e)) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::Level;
    use crate::notifiers::{DesktopNotifier, NotifierKind};
    use std::thread;

    fn description(entries: &[(&str, NotifierConfig)]) -> NotifierDescription {
        entries
            .iter()
            .map(|(name, config)| (name.to_string(), config.clone()))
            .collect()
    }

    #[test]
    fn test_add_get_remove() {
        let registry = NotifierRegistry::new();
        registry.add("desk", Notifier::new("desk", NotifierKind::Desktop(DesktopNotifier::new())));
        assert!(registry.get("desk").is_some());
        assert_eq!(registry.list(), vec!["desk"]);
        assert!(registry.remove("desk").is_some());
        assert!(registry.get("desk").is_none());
        assert!(registry.remove("desk").is_none());
    }

    #[test]
    fn test_add_replaces() {
        let registry = NotifierRegistry::new();
        registry.add("n", Notifier::new("n", NotifierKind::Desktop(DesktopNotifier::new())));
        let first = registry.get("n").unwrap();
        registry.add("n", Notifier::new("n", NotifierKind::Desktop(DesktopNotifier::new())));
        assert!(!Arc::ptr_eq(&first, &registry.get("n").unwrap()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_update_converges() {
        let registry = NotifierRegistry::new();
        registry.add("stale", Notifier::new("stale", NotifierKind::Desktop(DesktopNotifier::new())));

        let mut bogus = NotifierConfig::dbus();
        bogus.kind = "smoke-signal".into();
        let d = description(&[
            ("ops", NotifierConfig::http("http://127.0.0.1:9/hook")),
            ("stream", NotifierConfig::websocket("ws://127.0.0.1:9/events")),
            ("weird", bogus),
        ]);
        let skipped = registry.update_from_config(&d);

        assert_eq!(skipped.len(), 1);
        assert_eq!(registry.list(), vec!["ops", "stream"]);
        assert!(registry.get("weird").is_none());
        assert!(registry.get("stale").is_none());
    }

    #[test]
    fn test_update_is_idempotent() {
        let registry = NotifierRegistry::new();
        let d = description(&[
            ("ops", NotifierConfig::http("http://127.0.0.1:9/hook").with_level("error")),
            ("desk", NotifierConfig::dbus().with_sources(["cron"])),
        ]);
        registry.update_from_config(&d);
        let (names, described) = (registry.list(), registry.describe());
        registry.update_from_config(&d);
        assert_eq!(registry.list(), names);
        assert_eq!(registry.describe(), described);
    }

    #[test]
    fn test_notify_all_reports_failures() {
        let registry = NotifierRegistry::new();
        registry.add("desk", Notifier::new("desk", NotifierKind::Desktop(DesktopNotifier::new())));
        let record = Record::new(Level::Info, "hi");

        let failures = registry.notify_all(&record);
        if cfg!(feature = "dbus") {
            // a session bus may or may not exist on the test host
            assert!(failures.len() <= 1);
        } else {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].0, "desk");
            assert!(registry.try_notify_all(&record).is_err());
        }
    }

    #[test]
    fn test_concurrent_access() {
        let registry = Arc::new(NotifierRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for i in 0..50 {
                        let name = format!("n{}-{}", t, i % 5);
                        registry.add(
                            name.clone(),
                            Notifier::new(name.clone(), NotifierKind::Desktop(DesktopNotifier::new())),
                        );
                        let _ = registry.list();
                        if i % 2 == 0 {
                            registry.remove(&name);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(registry.len() <= 20);
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&NotifierRegistry::global(), &NotifierRegistry::global()));
    }
}
