use super::Writer;
use crate::bridge::{Decoder, JsonDecoder};
use crate::core::error::Result;
use crate::core::level::Level;
use crate::core::record::Record;
use crate::metrics::MetricsRegistry;
use crate::notifiers::NotifierRegistry;
use std::sync::Arc;

/// Forwards records to a notifier registry.
///
/// Records coming through the logging pipeline are delivered as they are,
/// whatever the local formatter. Raw bytes written directly are decoded back
/// into a record first. Delivery failures never reach the caller: each one is
/// reported on stderr and counted in `notifier_failures_total`, so local
/// persistence is unaffected.
pub struct NotifierWriter {
    registry: Arc<NotifierRegistry>,
    decoder: Arc<dyn Decoder>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl NotifierWriter {
    pub fn new(registry: Arc<NotifierRegistry>) -> Self {
        Self {
            registry,
            decoder: Arc::new(JsonDecoder),
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = decoder;
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &Arc<NotifierRegistry> {
        &self.registry
    }

    fn dispatch(&self, record: &Record) {
        for (name, err) in self.registry.notify_all(record) {
            eprintln!("[LOGGER WARNING] Notifier '{}' failed: {}", name, err);
            if let Some(metrics) = &self.metrics {
                metrics.increment("notifier_failures_total", 1.0);
            }
        }
    }
}

impl Writer for NotifierWriter {
    fn write(&self, buf: &[u8]) -> Result<()> {
        self.write_at(Level::Info, buf)
    }

    fn write_at(&self, level: Level, buf: &[u8]) -> Result<()> {
        if self.registry.is_empty() {
            return Ok(());
        }
        let Some(mut record) = self.decoder.decode(buf, level) else {
            return Ok(());
        };
        // text formats lose the level; the caller's level is authoritative
        if record.level != level {
            record = record.with_level(level);
        }
        self.dispatch(&record);
        Ok(())
    }

    fn write_record(&self, record: &Record, _buf: &[u8]) -> Result<()> {
        if !self.registry.is_empty() {
            self.dispatch(record);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "notifiers"
    }
}

impl std::fmt::Debug for NotifierWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierWriter")
            .field("notifiers", &self.registry.list())
            .finish()
    }
}
