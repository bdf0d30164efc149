use super::Writer;
use crate::core::error::Result;
use crate::core::level::Level;
use crate::core::record::Record;
use parking_lot::RwLock;
use std::sync::Arc;

/// Indirection to a swappable target.
///
/// Until a target is set, writes are accepted and discarded so that logging
/// during early startup never fails.
#[derive(Default)]
pub struct DynamicWriter {
    target: RwLock<Option<Arc<dyn Writer>>>,
}

impl DynamicWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(target: Arc<dyn Writer>) -> Self {
        Self {
            target: RwLock::new(Some(target)),
        }
    }

    /// Replace the target; the previous one is returned unclosed
    pub fn set(&self, target: Option<Arc<dyn Writer>>) -> Option<Arc<dyn Writer>> {
        std::mem::replace(&mut *self.target.write(), target)
    }

    pub fn get(&self) -> Option<Arc<dyn Writer>> {
        self.target.read().clone()
    }
}

impl Writer for DynamicWriter {
    fn write(&self, buf: &[u8]) -> Result<()> {
        match self.target.read().as_ref() {
            Some(target) => target.write(buf),
            None => Ok(()),
        }
    }

    fn write_at(&self, level: Level, buf: &[u8]) -> Result<()> {
        match self.target.read().as_ref() {
            Some(target) => target.write_at(level, buf),
            None => Ok(()),
        }
    }

    fn write_record(&self, record: &Record, buf: &[u8]) -> Result<()> {
        match self.target.read().as_ref() {
            Some(target) => target.write_record(record, buf),
            None => Ok(()),
        }
    }

    fn flush(&self) -> Result<()> {
        match self.target.read().as_ref() {
            Some(target) => target.flush(),
            None => Ok(()),
        }
    }

    fn close(&self) -> Result<()> {
        match self.target.read().as_ref() {
            Some(target) => target.close(),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "dynamic"
    }
}
