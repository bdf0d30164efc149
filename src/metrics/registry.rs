//! Named counters and gauges

use super::exporter::Exporter;
use crate::core::error::{LoggerError, Result};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::sync::Arc;

static METRIC_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z_0-9]*$").expect("metric name pattern compiles"));

static GLOBAL: Lazy<Arc<MetricsRegistry>> = Lazy::new(|| Arc::new(MetricsRegistry::new()));

/// Whether `name` is acceptable as a metric name
pub fn is_valid_name(name: &str) -> bool {
    METRIC_NAME.is_match(name)
}

/// A value with optional labels
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metric {
    pub value: f64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl Metric {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            labels: BTreeMap::new(),
        }
    }
}

/// In-memory metrics store.
///
/// Invalid names are ignored by every mutating operation. The optional export
/// whitelist only affects [`get_metrics`](Self::get_metrics) and the scrape
/// endpoint; [`get`](Self::get) always sees every metric.
///
/// # Example
///
/// ```
/// use logz::MetricsRegistry;
///
/// let metrics = MetricsRegistry::new();
/// metrics.increment("logs_total", 1.0);
/// metrics.increment("logs_total", 2.0);
/// metrics.increment("not a name", 1.0);
/// assert_eq!(metrics.get("logs_total"), Some(3.0));
/// assert_eq!(metrics.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    metrics: RwLock<BTreeMap<String, Metric>>,
    whitelist: RwLock<Option<BTreeSet<String>>>,
    exporter: Mutex<Option<Exporter>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> Arc<MetricsRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Set `name` to `value`, replacing any previous value and labels
    pub fn add<K, V>(&self, name: &str, value: f64, labels: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        if !is_valid_name(name) {
            return;
        }
        let metric = Metric {
            value,
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        };
        self.metrics.write().insert(name.to_string(), metric);
    }

    pub fn remove(&self, name: &str) -> Option<Metric> {
        self.metrics.write().remove(name)
    }

    /// Add `delta` to `name`, creating it at zero first when missing
    pub fn increment(&self, name: &str, delta: f64) {
        if !is_valid_name(name) {
            return;
        }
        let mut metrics = self.metrics.write();
        match metrics.get_mut(name) {
            Some(metric) => metric.value += delta,
            None => {
                metrics.insert(name.to_string(), Metric::new(delta));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.read().get(name).map(|m| m.value)
    }

    pub fn metric(&self, name: &str) -> Option<Metric> {
        self.metrics.read().get(name).cloned()
    }

    /// Snapshot of the exported values
    pub fn get_metrics(&self) -> BTreeMap<String, f64> {
        self.exported()
            .into_iter()
            .map(|(name, metric)| (name, metric.value))
            .collect()
    }

    /// Snapshot of the exported metrics, labels included
    pub fn exported(&self) -> BTreeMap<String, Metric> {
        let whitelist = self.whitelist.read();
        self.metrics
            .read()
            .iter()
            .filter(|(name, _)| whitelist.as_ref().map_or(true, |w| w.contains(*name)))
            .map(|(name, metric)| (name.clone(), metric.clone()))
            .collect()
    }

    /// Restrict exported metrics to `names`; an empty list lifts the restriction
    pub fn set_export_whitelist<S: Into<String>>(&self, names: impl IntoIterator<Item = S>) {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        *self.whitelist.write() = if names.is_empty() { None } else { Some(names) };
    }

    pub fn len(&self) -> usize {
        self.metrics.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.read().is_empty()
    }

    pub fn clear(&self) {
        self.metrics.write().clear();
    }

    /// Start serving the exported metrics in Prometheus text format.
    ///
    /// Port 0 binds a free port. Returns the bound address. Calling it while
    /// already enabled restarts the endpoint.
    pub fn enable(self: &Arc<Self>, port: u16) -> Result<SocketAddr> {
        self.disable();
        let exporter = Exporter::start(Arc::clone(self), port)?;
        let address = exporter.local_addr();
        *self.exporter.lock() = Some(exporter);
        Ok(address)
    }

    /// Stop the scrape endpoint, if running
    pub fn disable(&self) {
        if let Some(exporter) = self.exporter.lock().take() {
            exporter.stop();
        }
    }

    pub fn is_exporting(&self) -> bool {
        self.exporter.lock().is_some()
    }

    /// Render the exported metrics in Prometheus text exposition format
    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();
        for (name, metric) in self.exported() {
            out.push_str("# TYPE ");
            out.push_str(&name);
            out.push_str(if name.ends_with("_total") { " counter\n" } else { " gauge\n" });
            out.push_str(&name);
            if !metric.labels.is_empty() {
                let labels: Vec<String> = metric
                    .labels
                    .iter()
                    .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
                    .collect();
                out.push('{');
                out.push_str(&labels.join(","));
                out.push('}');
            }
            out.push(' ');
            out.push_str(&metric.value.to_string());
            out.push('\n');
        }
        out
    }

    /// Validate a name, returning an error instead of ignoring it
    pub fn check_name(name: &str) -> Result<()> {
        if is_valid_name(name) {
            Ok(())
        } else {
            Err(LoggerError::config("metrics", format!("invalid metric name '{}'", name)))
        }
    }
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_name_validation() {
        assert!(is_valid_name("logs_total"));
        assert!(is_valid_name("_x9"));
        assert!(!is_valid_name("9lives"));
        assert!(!is_valid_name("has-dash"));
        assert!(!is_valid_name(""));
        assert!(MetricsRegistry::check_name("a b").is_err());
    }

    #[test]
    fn test_invalid_names_ignored() {
        let metrics = MetricsRegistry::new();
        metrics.add("bad name", 1.0, Vec::<(String, String)>::new());
        metrics.increment("1st", 1.0);
        assert!(metrics.is_empty());
    }

    #[test]
    fn test_add_replaces() {
        let metrics = MetricsRegistry::new();
        metrics.add("queue_depth", 4.0, [("queue", "main")]);
        metrics.add("queue_depth", 2.0, [("queue", "aux")]);
        let metric = metrics.metric("queue_depth").unwrap();
        assert_eq!(metric.value, 2.0);
        assert_eq!(metric.labels.get("queue").map(String::as_str), Some("aux"));
        assert!(metrics.remove("queue_depth").is_some());
        assert_eq!(metrics.get("queue_depth"), None);
    }

    #[test]
    fn test_whitelist() {
        let metrics = MetricsRegistry::new();
        metrics.increment("logs_total", 1.0);
        metrics.increment("secret_total", 1.0);
        metrics.set_export_whitelist(["logs_total"]);
        assert_eq!(metrics.get_metrics().keys().collect::<Vec<_>>(), vec!["logs_total"]);
        assert_eq!(metrics.get("secret_total"), Some(1.0));

        metrics.set_export_whitelist(Vec::<String>::new());
        assert_eq!(metrics.get_metrics().len(), 2);
    }

    #[test]
    fn test_concurrent_increments() {
        let metrics = Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.increment("logs_total", 1.0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.get("logs_total"), Some(8000.0));
    }

    #[test]
    fn test_render_prometheus() {
        let metrics = MetricsRegistry::new();
        metrics.increment("logs_total", 3.0);
        metrics.add("queue_depth", 1.5, [("queue", "a\"b")]);
        let text = metrics.render_prometheus();
        assert!(text.contains("# TYPE logs_total counter\nlogs_total 3\n"));
        assert!(text.contains("# TYPE queue_depth gauge\nqueue_depth{queue=\"a\\\"b\"} 1.5\n"));
    }
}
