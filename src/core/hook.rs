//! Pipeline hooks

use super::error::Result;
use super::record::Record;
use std::fmt;

/// Point in the pipeline at which a hook fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
    /// Before the formatter runs; the record may still be enriched
    PreFormat,
    /// After the formatter produced bytes; changes no longer affect output
    PostFormat,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookStage::PreFormat => f.write_str("pre-format"),
            HookStage::PostFormat => f.write_str("post-format"),
        }
    }
}

/// Observer fired at both hook points.
///
/// Returning an error aborts the pipeline and the error reaches the caller.
/// The record is only borrowed for the duration of the call.
///
/// Closures implement this trait directly:
///
/// ```
/// use logz::{HookStage, Logger, Record};
///
/// let logger = Logger::builder().build();
/// logger.add_hook(|stage: HookStage, record: &mut Record| -> logz::Result<()> {
///     if stage == HookStage::PreFormat {
///         record.tags.insert("host".into(), "web-1".into());
///     }
///     Ok(())
/// });
/// ```
pub trait Hook: Send + Sync {
    fn fire(&self, stage: HookStage, record: &mut Record) -> Result<()>;
}

impl<F> Hook for F
where
    F: Fn(HookStage, &mut Record) -> Result<()> + Send + Sync,
{
    fn fire(&self, stage: HookStage, record: &mut Record) -> Result<()> {
        self(stage, record)
    }
}
