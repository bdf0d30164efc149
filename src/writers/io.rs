//! Raw byte sinks

use super::Writer;
use crate::core::error::{LoggerError, Result};
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Wraps any `io::Write`; one mutex guards every write so records never
/// interleave.
pub struct IoWriter {
    name: String,
    sink: Mutex<Option<Box<dyn Write + Send>>>,
}

impl IoWriter {
    pub fn new(name: impl Into<String>, sink: impl Write + Send + 'static) -> Self {
        Self {
            name: name.into(),
            sink: Mutex::new(Some(Box::new(sink))),
        }
    }

    pub fn stdout() -> Self {
        Self::new("stdout", io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new("stderr", io::stderr())
    }

    /// Append to `path`, creating it and its parent directory if needed
    pub fn file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::io_operation(
                    "open log file",
                    format!("Failed to open '{}'", path.display()),
                    e,
                )
            })?;
        Ok(Self::new(path.display().to_string(), BufWriter::new(file)))
    }
}

impl Writer for IoWriter {
    fn write(&self, buf: &[u8]) -> Result<()> {
        let mut sink = self.sink.lock();
        let sink = sink
            .as_mut()
            .ok_or_else(|| LoggerError::write_failed(&self.name, "writer is closed"))?;
        sink.write_all(buf)
            .map_err(|e| LoggerError::write_failed(&self.name, e.to_string()))
    }

    fn flush(&self) -> Result<()> {
        if let Some(sink) = self.sink.lock().as_mut() {
            sink.flush()
                .map_err(|e| LoggerError::write_failed(&self.name, e.to_string()))?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if let Some(mut sink) = self.sink.lock().take() {
            sink.flush()
                .map_err(|e| LoggerError::write_failed(&self.name, e.to_string()))?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for IoWriter {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.get_mut().as_mut() {
            let _ = sink.flush();
        }
    }
}

/// Accepts and drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardWriter;

impl Writer for DiscardWriter {
    fn write(&self, _buf: &[u8]) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "discard"
    }
}

/// In-memory sink; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.buf.lock().clone()
    }

    /// Buffer as UTF-8, lossily
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.buf.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.buf.lock().is_empty()
    }
}

impl Writer for MemoryWriter {
    fn write(&self, buf: &[u8]) -> Result<()> {
        self.buf.lock().extend_from_slice(buf);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
