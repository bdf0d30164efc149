use super::Writer;
use crate::core::error::{LoggerError, Result};
use crate::core::level::Level;
use crate::core::record::Record;
use parking_lot::RwLock;
use std::sync::Arc;

/// Ordered fan-out to child writers.
///
/// A failing child does not stop the fan-out; the last error is returned
/// once every child has been tried.
#[derive(Default)]
pub struct MultiWriter {
    children: RwLock<Vec<Arc<dyn Writer>>>,
}

impl MultiWriter {
    pub fn new(children: Vec<Arc<dyn Writer>>) -> Self {
        Self {
            children: RwLock::new(children),
        }
    }

    pub fn push(&self, child: Arc<dyn Writer>) {
        self.children.write().push(child);
    }

    pub fn len(&self) -> usize {
        self.children.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.read().is_empty()
    }

    fn each<F>(&self, mut op: F) -> Result<()>
    where
        F: FnMut(&dyn Writer) -> Result<()>,
    {
        let children = self.children.read().clone();
        let mut last_error: Option<LoggerError> = None;
        for child in &children {
            if let Err(e) = op(child.as_ref()) {
                last_error = Some(e);
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Writer for MultiWriter {
    fn write(&self, buf: &[u8]) -> Result<()> {
        self.each(|child| child.write(buf))
    }

    fn write_at(&self, level: Level, buf: &[u8]) -> Result<()> {
        self.each(|child| child.write_at(level, buf))
    }

    fn write_record(&self, record: &Record, buf: &[u8]) -> Result<()> {
        self.each(|child| child.write_record(record, buf))
    }

    fn flush(&self) -> Result<()> {
        self.each(|child| child.flush())
    }

    fn close(&self) -> Result<()> {
        self.each(|child| child.close())
    }

    fn name(&self) -> &str {
        "multi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writers::MemoryWriter;

    struct Failing(&'static str);

    impl Writer for Failing {
        fn write(&self, _buf: &[u8]) -> Result<()> {
            Err(LoggerError::write_failed(self.0, "refused"))
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_fan_out_in_order() {
        let a = MemoryWriter::new();
        let b = MemoryWriter::new();
        let multi = MultiWriter::new(vec![Arc::new(a.clone()), Arc::new(b.clone())]);
        multi.write(b"one\n").unwrap();
        multi.write(b"two\n").unwrap();
        assert_eq!(a.text(), "one\ntwo\n");
        assert_eq!(b.text(), "one\ntwo\n");
    }

    #[test]
    fn test_failure_continues_and_last_error_wins() {
        let tail = MemoryWriter::new();
        let multi = MultiWriter::new(vec![
            Arc::new(Failing("first")),
            Arc::new(Failing("second")),
            Arc::new(tail.clone()),
        ]);
        match multi.write(b"x\n") {
            Err(LoggerError::WriteFailed { writer, .. }) => assert_eq!(writer, "second"),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(tail.text(), "x\n");
    }

    #[test]
    fn test_push() {
        let multi = MultiWriter::default();
        assert!(multi.is_empty());
        multi.push(Arc::new(MemoryWriter::new()));
        assert_eq!(multi.len(), 1);
        assert!(multi.close().is_ok());
    }
}
