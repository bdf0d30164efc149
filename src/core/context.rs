//! Persistent logger context
//!
//! - `LoggerContext`: tags and fields shared by every record of a logger
//! - `ContextGuard`: RAII guard for a scoped field

use super::field::FieldValue;
use super::record::Record;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct ContextInner {
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
}

/// Logger-level persistent context.
///
/// Stored tags and fields are merged into each record before the pre-format
/// hooks run. Keys already present on the record take priority.
///
/// # Example
///
/// ```
/// use logz::{Level, LoggerContext, Record};
///
/// let ctx = LoggerContext::new();
/// ctx.set_tag("service", "api-gateway");
/// ctx.set_field("version", "1.2.3");
///
/// let mut record = Record::new(Level::Info, "started");
/// ctx.merge_into(&mut record);
/// assert_eq!(record.tags["service"], "api-gateway");
/// ```
#[derive(Debug, Clone, Default)]
pub struct LoggerContext {
    inner: Arc<RwLock<ContextInner>>,
}

impl LoggerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tag(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.write().tags.insert(key.into(), value.into());
    }

    /// Set a field; an existing field with the same key is overwritten
    pub fn set_field(&self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.inner.write().fields.insert(key.into(), value.into());
    }

    /// Set a field for the lifetime of the returned guard
    #[must_use = "the field is removed as soon as the guard is dropped"]
    pub fn scoped_field(
        &self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> ContextGuard {
        let key = key.into();
        self.set_field(key.clone(), value);
        ContextGuard {
            context: self.clone(),
            key,
        }
    }

    pub fn remove(&self, key: &str) {
        let mut inner = self.inner.write();
        inner.tags.remove(key);
        inner.fields.remove(key);
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.tags.clear();
        inner.fields.clear();
    }

    pub fn is_empty(&self) -> bool {
        let inner = self.inner.read();
        inner.tags.is_empty() && inner.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read();
        inner.tags.len() + inner.fields.len()
    }

    pub fn fields(&self) -> BTreeMap<String, FieldValue> {
        self.inner.read().fields.clone()
    }

    pub fn tags(&self) -> BTreeMap<String, String> {
        self.inner.read().tags.clone()
    }

    /// Merge context entries into a record; record-level keys win
    pub fn merge_into(&self, record: &mut Record) {
        let inner = self.inner.read();
        for (key, value) in &inner.tags {
            record
                .tags
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        for (key, value) in &inner.fields {
            record
                .fields
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

/// RAII guard for a scoped context field.
///
/// Dropping the guard removes the key from the logger context.
pub struct ContextGuard {
    context: LoggerContext,
    key: String,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        self.context.inner.write().fields.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::Level;

    #[test]
    fn test_context_basic() {
        let ctx = LoggerContext::new();
        assert!(ctx.is_empty());
        ctx.set_tag("service", "api-gateway");
        ctx.set_field("version", "1.2.3");
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_context_remove_and_clear() {
        let ctx = LoggerContext::new();
        ctx.set_field("key1", "value1");
        ctx.set_field("key2", "value2");
        ctx.remove("key1");
        assert!(!ctx.fields().contains_key("key1"));
        ctx.clear();
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_merge_priority() {
        let ctx = LoggerContext::new();
        ctx.set_field("key", "logger_value");
        ctx.set_tag("region", "eu");

        let mut record = Record::new(Level::Info, "x").with_field("key", "entry_value");
        ctx.merge_into(&mut record);

        assert_eq!(record.fields["key"], FieldValue::from("entry_value"));
        assert_eq!(record.tags["region"], "eu");
    }

    #[test]
    fn test_scoped_field_is_removed_on_drop() {
        let ctx = LoggerContext::new();
        {
            let _guard = ctx.scoped_field("request_id", "abc-123");
            assert!(ctx.fields().contains_key("request_id"));
        }
        assert!(!ctx.fields().contains_key("request_id"));
    }

    #[test]
    fn test_clones_share_state() {
        let ctx = LoggerContext::new();
        let other = ctx.clone();
        other.set_tag("a", "b");
        assert_eq!(ctx.tags()["a"], "b");
    }
}
