//! Byte stream to record adapter
//!
//! [`IoBridge`] lets code that only knows `std::io::Write` (child process
//! output, legacy libraries) feed the logger. Each complete, non-empty line
//! becomes one record.

use crate::core::level::Level;
use crate::core::logger::Logger;
use crate::core::record::Record;
use std::io::{self, Write};
use std::sync::Arc;

/// Turns raw bytes into a record
pub trait Decoder: Send + Sync {
    /// `None` means the input carries nothing worth logging
    fn decode(&self, bytes: &[u8], level: Level) -> Option<Record>;
}

/// Plain text: trims whitespace and uses the text as the message
#[derive(Debug, Clone, Copy, Default)]
pub struct LineDecoder;

impl Decoder for LineDecoder {
    fn decode(&self, bytes: &[u8], level: Level) -> Option<Record> {
        let text = String::from_utf8_lossy(bytes);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Record::new(level, text))
    }
}

/// Records produced by the JSON formatter; anything else is decoded as a line
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode(&self, bytes: &[u8], level: Level) -> Option<Record> {
        let trimmed = trim_ascii(bytes);
        if trimmed.first() == Some(&b'{') {
            if let Ok(record) = Record::from_json(trimmed) {
                if !record.message.is_empty() {
                    return Some(record);
                }
            }
        }
        LineDecoder.decode(bytes, level)
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// `std::io::Write` adapter logging one record per line.
///
/// A trailing partial line is held until its newline arrives or the bridge
/// is flushed. Without a logger or decoder every write is accepted and
/// discarded.
///
/// ```
/// use logz::bridge::IoBridge;
/// use logz::writers::MemoryWriter;
/// use logz::{Level, Logger};
/// use std::io::Write;
/// use std::sync::Arc;
///
/// let out = MemoryWriter::new();
/// let logger = Arc::new(Logger::builder().writer(out.clone()).build());
/// let mut bridge = IoBridge::new(logger, Level::Warn);
/// bridge.write_all(b"disk almost full\n\n").unwrap();
/// assert_eq!(out.lines().len(), 1);
/// ```
pub struct IoBridge {
    logger: Option<Arc<Logger>>,
    decoder: Option<Arc<dyn Decoder>>,
    level: Level,
    pending: Vec<u8>,
}

impl IoBridge {
    pub fn new(logger: Arc<Logger>, level: Level) -> Self {
        Self {
            logger: Some(logger),
            decoder: Some(Arc::new(LineDecoder)),
            level,
            pending: Vec::new(),
        }
    }

    /// A bridge that swallows everything until a logger is attached
    pub fn detached() -> Self {
        Self {
            logger: None,
            decoder: Some(Arc::new(LineDecoder)),
            level: Level::Info,
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    #[must_use]
    pub fn without_decoder(mut self) -> Self {
        self.decoder = None;
        self
    }

    pub fn set_logger(&mut self, logger: Option<Arc<Logger>>) {
        self.logger = logger;
    }

    pub fn level(&self) -> Level {
        self.level
    }

    fn emit(&self, line: &[u8]) -> io::Result<()> {
        let (Some(logger), Some(decoder)) = (&self.logger, &self.decoder) else {
            return Ok(());
        };
        match decoder.decode(line, self.level) {
            Some(record) => logger.log(record).map(|_| ()).map_err(io::Error::other),
            None => Ok(()),
        }
    }
}

impl Write for IoBridge {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.logger.is_none() || self.decoder.is_none() {
            return Ok(buf.len());
        }
        self.pending.extend_from_slice(buf);
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.emit(&line)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.emit(&line)?;
        }
        if let Some(logger) = &self.logger {
            logger.flush().map_err(io::Error::other)?;
        }
        Ok(())
    }
}

impl Drop for IoBridge {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            if let Err(e) = self.emit(&line) {
                eprintln!("[LOGGER WARNING] IO bridge dropped a partial line: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for IoBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoBridge")
            .field("attached", &self.logger.is_some())
            .field("level", &self.level)
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::{Formatter, JsonFormatter};
    use crate::writers::MemoryWriter;

    fn attached(level: Level) -> (IoBridge, MemoryWriter) {
        let out = MemoryWriter::new();
        let logger = Logger::builder()
            .min_level(Level::Trace)
            .formatter(Formatter::Json(JsonFormatter::new()))
            .writer(out.clone())
            .build();
        (IoBridge::new(Arc::new(logger), level), out)
    }

    #[test]
    fn test_line_decoder() {
        assert!(LineDecoder.decode(b"  \n", Level::Info).is_none());
        let record = LineDecoder.decode(b"  hello \n", Level::Warn).unwrap();
        assert_eq!(record.message, "hello");
        assert_eq!(record.level, Level::Warn);
    }

    #[test]
    fn test_json_decoder_falls_back() {
        let record = JsonDecoder
            .decode(br#"{"level":"error","msg":"boom","sev":40}"#, Level::Info)
            .unwrap();
        assert_eq!(record.level, Level::Error);
        assert_eq!(record.message, "boom");

        let record = JsonDecoder.decode(b"{not json", Level::Info).unwrap();
        assert_eq!(record.message, "{not json");
    }

    #[test]
    fn test_one_record_per_line() {
        let (mut bridge, out) = attached(Level::Notice);
        bridge.write_all(b"first\nsecond\n\n   \nthird").unwrap();
        assert_eq!(out.lines().len(), 2);

        bridge.flush().unwrap();
        let lines = out.lines();
        assert_eq!(lines.len(), 3);
        let last = Record::from_json(lines[2].as_bytes()).unwrap();
        assert_eq!(last.message, "third");
        assert_eq!(last.level, Level::Notice);
    }

    #[test]
    fn test_empty_input_is_noop() {
        let (mut bridge, out) = attached(Level::Info);
        assert_eq!(bridge.write(b"").unwrap(), 0);
        assert_eq!(bridge.write(b"\n").unwrap(), 1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_detached_absorbs_writes() {
        let mut bridge = IoBridge::detached();
        assert_eq!(bridge.write(b"early boot\n").unwrap(), 11);
        bridge.flush().unwrap();

        let (bridge, out) = attached(Level::Info);
        let mut bridge = bridge.without_decoder();
        assert_eq!(bridge.write(b"ignored\n").unwrap(), 8);
        assert!(out.is_empty());
    }
}
