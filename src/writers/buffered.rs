//! Background buffering in front of another writer
//!
//! Producers hand bytes to a bounded queue; a worker thread coalesces them
//! and writes to the inner writer when the buffer fills, when the flush
//! interval elapses, or when a flush is requested.

use super::Writer;
use crate::core::error::{LoggerError, Result};
use crate::core::level::Level;
use crate::core::overflow_policy::{LogPriority, OverflowCallback, OverflowPolicy};
use crate::metrics::MetricsRegistry;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
/// Shorter flush intervals are raised to this
pub const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(1);

enum Command {
    Write(Vec<u8>),
    Flush(Sender<Result<()>>),
}

/// Builder for [`BufferedWriter`]
///
/// # Example
///
/// ```
/// use logz::writers::{BufferedWriter, MemoryWriter};
/// use logz::OverflowPolicy;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let writer = BufferedWriter::builder()
///     .buffer_size(8 * 1024)
///     .flush_interval(Duration::from_millis(200))
///     .overflow_policy(OverflowPolicy::DropNewest)
///     .build(Arc::new(MemoryWriter::new()))
///     .unwrap();
/// ```
pub struct BufferedWriterBuilder {
    buffer_size: usize,
    flush_interval: Duration,
    queue_capacity: usize,
    overflow_policy: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl Default for BufferedWriterBuilder {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overflow_policy: OverflowPolicy::default(),
            on_overflow: None,
            metrics: None,
        }
    }
}

impl BufferedWriterBuilder {
    /// Bytes coalesced before the inner writer is called
    #[must_use]
    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes.max(1);
        self
    }

    /// Upper bound on how long bytes sit in the buffer, even under steady traffic
    #[must_use]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval.max(MIN_FLUSH_INTERVAL);
        self
    }

    /// Writes that may wait in the queue before the overflow policy applies
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Callback invoked on the first drop and every 1000 drops after
    #[must_use]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    /// Count drops into `buffer_dropped_total`
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self, inner: Arc<dyn Writer>) -> Result<BufferedWriter> {
        let (sender, receiver) = bounded(self.queue_capacity);
        let name = format!("buffered({})", inner.name());
        let worker_inner = Arc::clone(&inner);
        let buffer_size = self.buffer_size;
        let flush_interval = self.flush_interval;

        let handle = thread::Builder::new()
            .name("logz-buffered".to_string())
            .spawn(move || run_worker(receiver, worker_inner, buffer_size, flush_interval))
            .map_err(|e| LoggerError::io_operation("spawn buffered writer", "spawn failed", e))?;

        Ok(BufferedWriter {
            name,
            inner,
            sender: RwLock::new(Some(sender)),
            worker: Mutex::new(Some(handle)),
            overflow_policy: self.overflow_policy,
            on_overflow: self.on_overflow,
            metrics: self.metrics,
            dropped: AtomicU64::new(0),
        })
    }
}

pub struct BufferedWriter {
    name: String,
    inner: Arc<dyn Writer>,
    sender: RwLock<Option<Sender<Command>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    overflow_policy: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
    metrics: Option<Arc<MetricsRegistry>>,
    dropped: AtomicU64,
}

impl BufferedWriter {
    pub fn builder() -> BufferedWriterBuilder {
        BufferedWriterBuilder::default()
    }

    /// Buffer in front of `inner` with default settings
    pub fn new(inner: Arc<dyn Writer>) -> Result<Self> {
        Self::builder().build(inner)
    }

    /// Writes dropped because the queue was full
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn enqueue(&self, priority: LogPriority, bytes: Vec<u8>) -> Result<()> {
        let sender = self.sender.read();
        let sender = sender
            .as_ref()
            .ok_or_else(|| LoggerError::write_failed(&self.name, "writer is closed"))?;

        let command = match sender.try_send(Command::Write(bytes)) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Full(command)) => command,
            Err(TrySendError::Disconnected(_)) => {
                return Err(LoggerError::write_failed(&self.name, "worker has stopped"))
            }
        };

        // error and above are never dropped
        if priority == LogPriority::Critical {
            return sender
                .send(command)
                .map_err(|_| LoggerError::write_failed(&self.name, "worker has stopped"));
        }

        match &self.overflow_policy {
            OverflowPolicy::Block => sender
                .send(command)
                .map_err(|_| LoggerError::write_failed(&self.name, "worker has stopped")),
            OverflowPolicy::BlockWithTimeout(timeout) => match sender.send_timeout(command, *timeout) {
                Ok(()) => Ok(()),
                Err(SendTimeoutError::Timeout(_)) => {
                    self.record_drop(true);
                    Ok(())
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    Err(LoggerError::write_failed(&self.name, "worker has stopped"))
                }
            },
            OverflowPolicy::DropNewest => {
                self.record_drop(false);
                Ok(())
            }
            OverflowPolicy::AlertAndDrop => {
                self.record_drop(true);
                Ok(())
            }
        }
    }

    fn record_drop(&self, alert: bool) {
        let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(metrics) = &self.metrics {
            metrics.increment("buffer_dropped_total", 1.0);
        }

        if alert && (dropped == 1 || dropped % 1000 == 0) {
            eprintln!(
                "[LOGGER WARNING] Buffer queue of {} full, {} writes dropped. \
                 Consider increasing the queue capacity or using a blocking overflow policy.",
                self.name, dropped
            );
            if let Some(callback) = &self.on_overflow {
                callback(dropped);
            }
        }
    }

    fn shutdown(&self) -> Result<()> {
        drop(self.sender.write().take());
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                eprintln!("[LOGGER ERROR] Buffered writer worker panicked during shutdown");
            }
        }
        Ok(())
    }
}

impl Writer for BufferedWriter {
    fn write(&self, buf: &[u8]) -> Result<()> {
        self.write_at(Level::Info, buf)
    }

    fn write_at(&self, level: Level, buf: &[u8]) -> Result<()> {
        self.enqueue(LogPriority::of(level), buf.to_vec())
    }

    /// Returns once every write queued before the call reached the inner
    /// writer and the inner writer was flushed
    fn flush(&self) -> Result<()> {
        let (ack, done) = bounded(1);
        {
            let sender = self.sender.read();
            let Some(sender) = sender.as_ref() else {
                return Ok(());
            };
            sender
                .send(Command::Flush(ack))
                .map_err(|_| LoggerError::write_failed(&self.name, "worker has stopped"))?;
        }
        done.recv()
            .map_err(|_| LoggerError::write_failed(&self.name, "worker stopped before flushing"))?
    }

    fn close(&self) -> Result<()> {
        self.shutdown()?;
        self.inner.close()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for BufferedWriter {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            eprintln!("[LOGGER ERROR] Failed to drain {}: {}", self.name, e);
        }
    }
}

fn run_worker(
    receiver: Receiver<Command>,
    inner: Arc<dyn Writer>,
    buffer_size: usize,
    flush_interval: Duration,
) {
    let mut buffer: Vec<u8> = Vec::with_capacity(buffer_size);

    let drain = |buffer: &mut Vec<u8>| -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        let result = inner.write(buffer);
        buffer.clear();
        result
    };

    let mut next_flush = deadline(Instant::now(), flush_interval);
    loop {
        match receiver.recv_deadline(next_flush) {
            Ok(Command::Write(bytes)) => {
                buffer.extend_from_slice(&bytes);
                if buffer.len() >= buffer_size {
                    if let Err(e) = drain(&mut buffer) {
                        eprintln!("[LOGGER ERROR] Buffered write to {} failed: {}", inner.name(), e);
                    }
                }
            }
            Ok(Command::Flush(ack)) => {
                let result = drain(&mut buffer).and_then(|_| inner.flush());
                let _ = ack.send(result);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                if let Err(e) = drain(&mut buffer).and_then(|_| inner.flush()) {
                    eprintln!("[LOGGER ERROR] Final flush of {} failed: {}", inner.name(), e);
                }
                break;
            }
        }

        // the deadline is fixed, so a steady stream of writes cannot postpone it
        let now = Instant::now();
        if now >= next_flush {
            if !buffer.is_empty() {
                if let Err(e) = drain(&mut buffer).and_then(|_| inner.flush()) {
                    eprintln!("[LOGGER ERROR] Periodic flush of {} failed: {}", inner.name(), e);
                }
            }
            next_flush = deadline(now, flush_interval);
        }
    }
}

fn deadline(from: Instant, interval: Duration) -> Instant {
    // effectively never for intervals past what Instant can represent
    from.checked_add(interval)
        .unwrap_or_else(|| from + Duration::from_secs(365 * 24 * 3600))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writers::MemoryWriter;
    use std::sync::atomic::AtomicBool;

    /// Inner writer that blocks until released
    struct Gate {
        open: AtomicBool,
        memory: MemoryWriter,
    }

    impl Writer for Gate {
        fn write(&self, buf: &[u8]) -> Result<()> {
            while !self.open.load(Ordering::Acquire) {
                thread::sleep(Duration::from_millis(1));
            }
            self.memory.write(buf)
        }

        fn name(&self) -> &str {
            "gate"
        }
    }

    #[test]
    fn test_flush_is_a_barrier() {
        let memory = MemoryWriter::new();
        let writer = BufferedWriter::builder()
            .flush_interval(Duration::from_secs(60))
            .build(Arc::new(memory.clone()))
            .unwrap();

        for i in 0..100 {
            writer.write(format!("line {}\n", i).as_bytes()).unwrap();
        }
        assert!(memory.is_empty());
        writer.flush().unwrap();
        assert_eq!(memory.lines().len(), 100);
        assert_eq!(memory.lines()[99], "line 99");
    }

    #[test]
    fn test_buffer_size_triggers_write() {
        let memory = MemoryWriter::new();
        let writer = BufferedWriter::builder()
            .buffer_size(10)
            .flush_interval(Duration::from_secs(60))
            .build(Arc::new(memory.clone()))
            .unwrap();
        writer.write(b"0123456789abc\n").unwrap();

        for _ in 0..200 {
            if !memory.is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(memory.text(), "0123456789abc\n");
    }

    #[test]
    fn test_flush_interval() {
        let memory = MemoryWriter::new();
        let writer = BufferedWriter::builder()
            .flush_interval(Duration::from_millis(20))
            .build(Arc::new(memory.clone()))
            .unwrap();
        writer.write(b"tick\n").unwrap();

        for _ in 0..200 {
            if !memory.is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(memory.text(), "tick\n");
        drop(writer);
    }

    #[test]
    fn test_steady_traffic_does_not_postpone_flush() {
        let memory = MemoryWriter::new();
        let writer = BufferedWriter::builder()
            .buffer_size(1 << 20)
            .flush_interval(Duration::from_millis(100))
            .build(Arc::new(memory.clone()))
            .unwrap();

        // one line every 20ms for 600ms; the gap never reaches the interval
        let started = Instant::now();
        let mut i = 0;
        while started.elapsed() < Duration::from_millis(600) {
            writer.write(format!("line {}\n", i).as_bytes()).unwrap();
            i += 1;
            thread::sleep(Duration::from_millis(20));
        }

        assert!(!memory.is_empty(), "no periodic flush during steady traffic");
        writer.flush().unwrap();
        assert_eq!(memory.lines().len(), i);
    }

    #[test]
    fn test_zero_flush_interval_is_clamped() {
        let builder = BufferedWriter::builder().flush_interval(Duration::ZERO);
        assert_eq!(builder.flush_interval, MIN_FLUSH_INTERVAL);

        let memory = MemoryWriter::new();
        let writer = builder.build(Arc::new(memory.clone())).unwrap();
        writer.write(b"tick\n").unwrap();
        for _ in 0..200 {
            if !memory.is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(memory.text(), "tick\n");
    }

    #[test]
    fn test_drop_newest_counts_and_keeps_critical() {
        let gate = Arc::new(Gate {
            open: AtomicBool::new(false),
            memory: MemoryWriter::new(),
        });
        let metrics = Arc::new(MetricsRegistry::new());
        let writer = Arc::new(
            BufferedWriter::builder()
                .buffer_size(1)
                .queue_capacity(1)
                .overflow_policy(OverflowPolicy::DropNewest)
                .metrics(Arc::clone(&metrics))
                .build(gate.clone())
                .unwrap(),
        );

        // worker takes the first write and blocks in the gate, the second fills the queue
        writer.write(b"a\n").unwrap();
        thread::sleep(Duration::from_millis(50));
        writer.write(b"b\n").unwrap();
        writer.write(b"dropped\n").unwrap();
        assert_eq!(writer.dropped_count(), 1);
        assert_eq!(metrics.get("buffer_dropped_total"), Some(1.0));

        let critical = {
            let writer = Arc::clone(&writer);
            thread::spawn(move || writer.write_at(Level::Error, b"critical\n"))
        };
        thread::sleep(Duration::from_millis(20));
        gate.open.store(true, Ordering::Release);
        critical.join().unwrap().unwrap();
        writer.flush().unwrap();

        let text = gate.memory.text();
        assert!(text.contains("critical"));
        assert!(!text.contains("dropped"));
        assert_eq!(writer.dropped_count(), 1);
    }

    #[test]
    fn test_close_drains_and_rejects() {
        let memory = MemoryWriter::new();
        let writer = BufferedWriter::builder()
            .flush_interval(Duration::from_secs(60))
            .build(Arc::new(memory.clone()))
            .unwrap();
        writer.write(b"last words\n").unwrap();
        writer.close().unwrap();
        assert_eq!(memory.text(), "last words\n");
        assert!(writer.write(b"late\n").is_err());
        assert!(writer.flush().is_ok());
    }
}
