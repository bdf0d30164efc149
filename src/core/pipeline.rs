//! Staged record processing
//!
//! `Validate -> PreHooks -> Format -> PostHooks -> Write -> Done`, with
//! `Failed` reachable from every stage. Progress is kept in one atomic word
//! so another thread can observe it or request cancellation; cancellation is
//! honored only between stages, never in the middle of I/O.

use super::context::LoggerContext;
use super::error::{LoggerError, Result};
use super::hook::{Hook, HookStage};
use super::level::Level;
use super::record::Record;
use crate::formatters::Formatter;
use crate::metrics::MetricsRegistry;
use crate::writers::Writer;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validate,
    PreHooks,
    Format,
    PostHooks,
    Write,
    Done,
    Failed,
}

impl Stage {
    #[inline]
    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::PreHooks => "pre-hooks",
            Stage::Format => "format",
            Stage::PostHooks => "post-hooks",
            Stage::Write => "write",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const CANCEL_BIT: u32 = 1 << 31;
const ENTERED_BIT: u32 = 1 << 30;
const TERMINAL: u32 = Stage::Done.bit() | Stage::Failed.bit();

/// Snapshot of a pipeline's state word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineState(u32);

impl PipelineState {
    /// Whether `stage` has been passed (or, for `Done`/`Failed`, reached)
    pub fn completed(&self, stage: Stage) -> bool {
        self.0 & stage.bit() != 0
    }

    pub fn is_cancelled(&self) -> bool {
        self.0 & CANCEL_BIT != 0
    }

    pub fn is_terminal(&self) -> bool {
        self.0 & TERMINAL != 0
    }

    pub fn is_started(&self) -> bool {
        self.0 & ENTERED_BIT != 0
    }

    pub fn bits(&self) -> u32 {
        self.0
    }
}

/// Result of a pipeline run that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Bytes reached the writer
    Written,
    /// Gated out by level; nothing was produced
    Skipped,
    /// A `fatal` record was written; the host must terminate
    Fatal,
}

/// Gate applied during the validate stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelGate {
    pub min_severity: i32,
    pub max_severity: i32,
}

impl LevelGate {
    pub fn new(min: Level, max: Option<Level>) -> Self {
        Self {
            min_severity: min.severity(),
            max_severity: max.map_or(i32::MAX, Level::severity),
        }
    }

    #[inline]
    pub fn admits(&self, severity: i32) -> bool {
        severity >= self.min_severity && severity <= self.max_severity
    }
}

impl Default for LevelGate {
    fn default() -> Self {
        Self::new(Level::Info, None)
    }
}

/// One record's trip from acceptance to write.
///
/// The pipeline only borrows the logger's snapshotted collaborators, so it
/// never outlives the call that created it.
///
/// ```
/// use logz::pipeline::{LevelGate, Outcome, Pipeline, Stage};
/// use logz::writers::MemoryWriter;
/// use logz::{Formatter, Level, Record};
///
/// let formatter = Formatter::from_name("minimal").unwrap();
/// let out = MemoryWriter::new();
/// let pipeline = Pipeline::new(&formatter, &out, &[], LevelGate::default());
///
/// assert_eq!(pipeline.run(Record::new(Level::Warn, "low disk")).unwrap(), Outcome::Written);
/// assert!(pipeline.state().completed(Stage::Write));
/// assert_eq!(out.text(), "WARN low disk\n");
/// ```
pub struct Pipeline<'a> {
    formatter: &'a Formatter,
    writer: &'a dyn Writer,
    hooks: &'a [Arc<dyn Hook>],
    gate: LevelGate,
    context: Option<&'a LoggerContext>,
    metrics: Option<&'a MetricsRegistry>,
    state: AtomicU32,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        formatter: &'a Formatter,
        writer: &'a dyn Writer,
        hooks: &'a [Arc<dyn Hook>],
        gate: LevelGate,
    ) -> Self {
        Self {
            formatter,
            writer,
            hooks,
            gate,
            context: None,
            metrics: None,
            state: AtomicU32::new(0),
        }
    }

    /// Persistent tags and fields merged into the record before pre-hooks
    #[must_use]
    pub fn with_context(mut self, context: &'a LoggerContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Registry receiving `logs_total` and `logs_total_<level>`
    #[must_use]
    pub fn with_metrics(mut self, metrics: &'a MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn state(&self) -> PipelineState {
        PipelineState(self.state.load(Ordering::Acquire))
    }

    /// Ask the pipeline to stop at the next stage boundary
    pub fn cancel(&self) {
        self.state.fetch_or(CANCEL_BIT, Ordering::AcqRel);
    }

    pub fn run(&self, record: Record) -> Result<Outcome> {
        let previous = self.state.fetch_or(ENTERED_BIT, Ordering::AcqRel);
        if previous & (TERMINAL | ENTERED_BIT) != 0 {
            return Err(LoggerError::Terminal);
        }

        match self.stages(record) {
            Ok(outcome) => {
                self.state.fetch_or(Stage::Done.bit(), Ordering::AcqRel);
                Ok(outcome)
            }
            Err(e) => {
                self.state.fetch_or(Stage::Failed.bit(), Ordering::AcqRel);
                Err(e)
            }
        }
    }

    fn stages(&self, mut record: Record) -> Result<Outcome> {
        self.enter(Stage::Validate, None)?;
        record.validate()?;
        if record.level == Level::Silent || !self.gate.admits(record.severity) {
            self.complete(Stage::Validate);
            return Ok(Outcome::Skipped);
        }
        if let Some(context) = self.context {
            context.merge_into(&mut record);
        }

        self.enter(Stage::PreHooks, Some(Stage::Validate))?;
        self.fire(HookStage::PreFormat, &mut record)?;

        self.enter(Stage::Format, Some(Stage::PreHooks))?;
        let mut bytes = self.formatter.format(&record)?;
        if bytes.last() != Some(&b'\n') {
            bytes.push(b'\n');
        }

        self.enter(Stage::PostHooks, Some(Stage::Format))?;
        self.fire(HookStage::PostFormat, &mut record)?;

        self.enter(Stage::Write, Some(Stage::PostHooks))?;
        self.writer.write_record(&record, &bytes)?;
        self.complete(Stage::Write);

        if let Some(metrics) = self.metrics {
            metrics.increment("logs_total", 1.0);
            metrics.increment(&format!("logs_total_{}", record.level.to_str()), 1.0);
        }

        if record.level == Level::Fatal {
            Ok(Outcome::Fatal)
        } else {
            Ok(Outcome::Written)
        }
    }

    fn enter(&self, stage: Stage, previous: Option<Stage>) -> Result<()> {
        let bits = previous.map_or(0, Stage::bit);
        let state = self.state.fetch_or(bits, Ordering::AcqRel) | bits;
        if state & CANCEL_BIT != 0 {
            return Err(LoggerError::Cancelled {
                stage: stage.as_str(),
            });
        }
        Ok(())
    }

    fn complete(&self, stage: Stage) {
        self.state.fetch_or(stage.bit(), Ordering::AcqRel);
    }

    fn fire(&self, stage: HookStage, record: &mut Record) -> Result<()> {
        for hook in self.hooks {
            hook.fire(stage, record)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("formatter", &self.formatter.name())
            .field("writer", &self.writer.name())
            .field("hooks", &self.hooks.len())
            .field("gate", &self.gate)
            .field("state", &self.state())
            .finish()
    }
}
