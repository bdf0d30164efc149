//! Metrics registry and Prometheus scrape endpoint
//!
//! The library itself maintains these counters:
//!
//! - `logs_total` and `logs_total_<level>`: successful writes
//! - `notifier_failures_total`: failed notifier deliveries
//! - `buffer_dropped_total`: records dropped by a full buffered writer

mod exporter;
mod registry;

pub use registry::{is_valid_name, Metric, MetricsRegistry};
