//! Byte destinations for formatted records
//!
//! Every writer is shared between threads and takes `&self`; each
//! implementation serializes its own I/O so one record's bytes are never
//! interleaved with another's.

mod buffered;
mod dynamic;
mod io;
mod multi;
mod network;
mod notifier;
mod rotating_file;

pub use buffered::{BufferedWriter, BufferedWriterBuilder};
pub use dynamic::DynamicWriter;
pub use io::{DiscardWriter, IoWriter, MemoryWriter};
pub use multi::MultiWriter;
pub use network::{NetworkWriter, Transport};
pub use notifier::NotifierWriter;
pub use rotating_file::{RotatingFileWriter, RotationPolicy};

use crate::core::error::Result;
use crate::core::level::Level;
use crate::core::record::Record;
use std::sync::Arc;

pub trait Writer: Send + Sync {
    fn write(&self, buf: &[u8]) -> Result<()>;

    /// Write with the severity of the record that produced `buf`.
    ///
    /// Writers that treat records differently by level (buffering) override
    /// this; everyone else ignores the level.
    fn write_at(&self, level: Level, buf: &[u8]) -> Result<()> {
        let _ = level;
        self.write(buf)
    }

    /// Write the bytes formatted from `record`.
    ///
    /// This is the entry point the logging pipeline uses. Writers that need
    /// the structured record rather than its rendering (notifiers) override
    /// it; the default forwards to [`Writer::write_at`].
    fn write_record(&self, record: &Record, buf: &[u8]) -> Result<()> {
        self.write_at(record.level, buf)
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Flush and release the destination; writes afterwards fail
    fn close(&self) -> Result<()> {
        self.flush()
    }

    fn name(&self) -> &str;
}

impl<W: Writer + ?Sized> Writer for Arc<W> {
    fn write(&self, buf: &[u8]) -> Result<()> {
        (**self).write(buf)
    }

    fn write_at(&self, level: Level, buf: &[u8]) -> Result<()> {
        (**self).write_at(level, buf)
    }

    fn write_record(&self, record: &Record, buf: &[u8]) -> Result<()> {
        (**self).write_record(record, buf)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<W: Writer + ?Sized> Writer for Box<W> {
    fn write(&self, buf: &[u8]) -> Result<()> {
        (**self).write(buf)
    }

    fn write_at(&self, level: Level, buf: &[u8]) -> Result<()> {
        (**self).write_at(level, buf)
    }

    fn write_record(&self, record: &Record, buf: &[u8]) -> Result<()> {
        (**self).write_record(record, buf)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
