//! Main logger implementation

use super::{
    context::LoggerContext,
    error::Result,
    hook::Hook,
    level::Level,
    pipeline::{LevelGate, Outcome, Pipeline},
    record::Record,
};
use crate::formatters::Formatter;
use crate::metrics::MetricsRegistry;
use crate::notifiers::NotifierRegistry;
use crate::writers::{IoWriter, MultiWriter, NotifierWriter, Writer};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// Invoked after a `fatal` record was written and flushed
pub type FatalHandler = Arc<dyn Fn() + Send + Sync>;

const NO_MAX: i32 = i32::MAX;

/// What `Log` snapshots before running the pipeline
struct Shared {
    formatter: Arc<Formatter>,
    output: Arc<dyn Writer>,
    writer: Arc<dyn Writer>,
    hooks: Arc<Vec<Arc<dyn Hook>>>,
}

/// Leveled front end over the record pipeline.
///
/// Setters are serialized under a write lock; [`log`](Self::log) snapshots
/// the formatter, writer and hooks under a read lock and runs the pipeline
/// without holding it. Level checks read atomics only.
///
/// When a notifier registry is attached, its adapter writer is kept after
/// the local output, so local writes are always attempted first and
/// replacing the output with [`set_output`](Self::set_output) keeps
/// notifications flowing.
///
/// # Example
///
/// ```
/// use logz::writers::MemoryWriter;
/// use logz::{JsonFormatter, Level, Logger, Record};
///
/// let out = MemoryWriter::new();
/// let logger = Logger::builder()
///     .min_level(Level::Info)
///     .formatter(JsonFormatter::new())
///     .writer(out.clone())
///     .build();
///
/// logger.log(Record::new(Level::Debug, "x")).unwrap();
/// assert!(out.is_empty());
///
/// logger.log(Record::new(Level::Info, "hello").with_field("n", 1)).unwrap();
/// assert!(out.text().ends_with("\"msg\":\"hello\",\"sev\":20,\"fields\":{\"n\":1}}\n"));
/// ```
pub struct Logger {
    shared: RwLock<Shared>,
    min_severity: AtomicI32,
    max_severity: AtomicI32,
    context: LoggerContext,
    metrics: Option<Arc<MetricsRegistry>>,
    notifiers: Option<Arc<NotifierWriter>>,
    on_fatal: FatalHandler,
}

impl Logger {
    /// Text to stdout at `info`
    #[must_use]
    pub fn new() -> Self {
        LoggerBuilder::new().build()
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn set_formatter(&self, formatter: impl Into<Formatter>) {
        self.shared.write().formatter = Arc::new(formatter.into());
    }

    /// Replace the local output; the notifier adapter, if any, is kept
    pub fn set_output(&self, output: Arc<dyn Writer>) -> Arc<dyn Writer> {
        let writer = compose(Arc::clone(&output), self.notifiers.as_ref());
        let mut shared = self.shared.write();
        shared.writer = writer;
        std::mem::replace(&mut shared.output, output)
    }

    pub fn output(&self) -> Arc<dyn Writer> {
        Arc::clone(&self.shared.read().output)
    }

    pub fn formatter(&self) -> Arc<Formatter> {
        Arc::clone(&self.shared.read().formatter)
    }

    pub fn set_min_level(&self, level: Level) {
        self.min_severity.store(level.severity(), Ordering::Release);
    }

    pub fn min_level(&self) -> Level {
        Level::from_severity(self.min_severity.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Cap the accepted severity; `None` removes the cap
    pub fn set_max_level(&self, level: Option<Level>) {
        self.max_severity
            .store(level.map_or(NO_MAX, Level::severity), Ordering::Release);
    }

    pub fn max_level(&self) -> Option<Level> {
        match self.max_severity.load(Ordering::Acquire) {
            NO_MAX => None,
            severity => Level::from_severity(severity),
        }
    }

    pub fn add_hook(&self, hook: impl Hook + 'static) {
        let mut shared = self.shared.write();
        Arc::make_mut(&mut shared.hooks).push(Arc::new(hook));
    }

    pub fn clear_hooks(&self) {
        self.shared.write().hooks = Arc::new(Vec::new());
    }

    /// Whether a record at `level` would pass the level gate
    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level != Level::Silent && self.gate().admits(level.severity())
    }

    pub fn context(&self) -> &LoggerContext {
        &self.context
    }

    pub fn metrics(&self) -> Option<&Arc<MetricsRegistry>> {
        self.metrics.as_ref()
    }

    pub fn notifiers(&self) -> Option<&Arc<NotifierRegistry>> {
        self.notifiers.as_ref().map(|n| n.registry())
    }

    fn gate(&self) -> LevelGate {
        LevelGate {
            min_severity: self.min_severity.load(Ordering::Acquire),
            max_severity: self.max_severity.load(Ordering::Acquire),
        }
    }

    /// Run one record through the pipeline.
    ///
    /// On a `fatal` record the writer is flushed and the fatal handler runs
    /// (by default the process exits with status 1).
    pub fn log(&self, record: Record) -> Result<Outcome> {
        let (formatter, writer, hooks) = {
            let shared = self.shared.read();
            (
                Arc::clone(&shared.formatter),
                Arc::clone(&shared.writer),
                Arc::clone(&shared.hooks),
            )
        };

        let mut pipeline =
            Pipeline::new(&formatter, &*writer, &hooks, self.gate()).with_context(&self.context);
        if let Some(metrics) = &self.metrics {
            pipeline = pipeline.with_metrics(metrics);
        }
        let outcome = pipeline.run(record)?;

        if outcome == Outcome::Fatal {
            if let Err(e) = writer.flush() {
                eprintln!("[LOGGER ERROR] Failed to flush before fatal exit: {}", e);
            }
            (self.on_fatal)();
        }
        Ok(outcome)
    }

    /// Build and log a record; failures are reported on stderr
    pub fn log_message(&self, level: Level, message: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }
        if let Err(e) = self.log(Record::new(level, message)) {
            eprintln!("[LOGGER ERROR] Failed to log record: {}", e);
        }
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log_message(Level::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log_message(Level::Debug, message);
    }

    #[inline]
    pub fn notice(&self, message: impl Into<String>) {
        self.log_message(Level::Notice, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log_message(Level::Info, message);
    }

    #[inline]
    pub fn success(&self, message: impl Into<String>) {
        self.log_message(Level::Success, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log_message(Level::Warn, message);
    }

    #[inline]
    pub fn alert(&self, message: impl Into<String>) {
        self.log_message(Level::Alert, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log_message(Level::Error, message);
    }

    #[inline]
    pub fn critical(&self, message: impl Into<String>) {
        self.log_message(Level::Critical, message);
    }

    /// Log at `fatal`; the fatal handler runs after the write
    #[inline]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log_message(Level::Fatal, message);
    }

    pub fn flush(&self) -> Result<()> {
        let writer = Arc::clone(&self.shared.read().writer);
        writer.flush()
    }

    /// Flush and close every writer
    pub fn close(&self) -> Result<()> {
        let writer = Arc::clone(&self.shared.read().writer);
        writer.close()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.shared.get_mut().writer.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.read();
        f.debug_struct("Logger")
            .field("formatter", &shared.formatter.name())
            .field("output", &shared.output.name())
            .field("hooks", &shared.hooks.len())
            .field("min_level", &self.min_level())
            .field("max_level", &self.max_level())
            .field("notifiers", &self.notifiers.is_some())
            .finish()
    }
}

fn compose(output: Arc<dyn Writer>, notifiers: Option<&Arc<NotifierWriter>>) -> Arc<dyn Writer> {
    match notifiers {
        Some(adapter) => {
            let adapter: Arc<dyn Writer> = Arc::clone(adapter) as Arc<dyn Writer>;
            Arc::new(MultiWriter::new(vec![output, adapter]))
        }
        None => output,
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use logz::prelude::*;
/// use std::sync::Arc;
///
/// let metrics = Arc::new(MetricsRegistry::new());
/// let logger = Logger::builder()
///     .min_level(Level::Debug)
///     .max_level(Level::Critical)
///     .formatter(Formatter::from_name("minimal").unwrap())
///     .writer(MemoryWriter::new())
///     .metrics(Arc::clone(&metrics))
///     .on_fatal(|| eprintln!("fatal record logged"))
///     .build();
///
/// logger.info("ready");
/// assert_eq!(metrics.get("logs_total"), Some(1.0));
/// ```
pub struct LoggerBuilder {
    min_level: Level,
    max_level: Option<Level>,
    formatter: Formatter,
    writers: Vec<Arc<dyn Writer>>,
    hooks: Vec<Arc<dyn Hook>>,
    context: LoggerContext,
    metrics: Option<Arc<MetricsRegistry>>,
    notifiers: Option<Arc<NotifierRegistry>>,
    on_fatal: Option<FatalHandler>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            min_level: Level::Info,
            max_level: None,
            formatter: Formatter::default(),
            writers: Vec::new(),
            hooks: Vec::new(),
            context: LoggerContext::new(),
            metrics: None,
            notifiers: None,
            on_fatal: None,
        }
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_level(mut self, level: Level) -> Self {
        self.max_level = Some(level);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn formatter(mut self, formatter: impl Into<Formatter>) -> Self {
        self.formatter = formatter.into();
        self
    }

    /// Add a local writer; several writers are combined in order
    #[must_use = "builder methods return a new value"]
    pub fn writer<W: Writer + 'static>(mut self, writer: W) -> Self {
        self.writers.push(Arc::new(writer));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn shared_writer(mut self, writer: Arc<dyn Writer>) -> Self {
        self.writers.push(writer);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn hook(mut self, hook: impl Hook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn context(mut self, context: LoggerContext) -> Self {
        self.context = context;
        self
    }

    /// Count `logs_total`, `logs_total_<level>` and notifier failures here
    #[must_use = "builder methods return a new value"]
    pub fn metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Fan records out to this registry after the local writers
    #[must_use = "builder methods return a new value"]
    pub fn notifiers(mut self, registry: Arc<NotifierRegistry>) -> Self {
        self.notifiers = Some(registry);
        self
    }

    /// Replace the default fatal handler (`std::process::exit(1)`)
    #[must_use = "builder methods return a new value"]
    pub fn on_fatal<F>(mut self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_fatal = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Logger {
        let mut writers = self.writers;
        let output: Arc<dyn Writer> = match writers.len() {
            0 => Arc::new(IoWriter::stdout()),
            1 => writers.remove(0),
            _ => Arc::new(MultiWriter::new(writers)),
        };

        let notifiers = self.notifiers.map(|registry| {
            let adapter = NotifierWriter::new(registry);
            Arc::new(match &self.metrics {
                Some(metrics) => adapter.with_metrics(Arc::clone(metrics)),
                None => adapter,
            })
        });

        Logger {
            shared: RwLock::new(Shared {
                formatter: Arc::new(self.formatter),
                writer: compose(Arc::clone(&output), notifiers.as_ref()),
                output,
                hooks: Arc::new(self.hooks),
            }),
            min_severity: AtomicI32::new(self.min_level.severity()),
            max_severity: AtomicI32::new(self.max_level.map_or(NO_MAX, Level::severity)),
            context: self.context,
            metrics: self.metrics,
            notifiers,
            on_fatal: self
                .on_fatal
                .unwrap_or_else(|| Arc::new(|| {
                    std::process::exit(1);
                })),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
