//! Core logger types and traits

pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod field;
pub mod hook;
pub mod level;
pub mod logger;
pub mod overflow_policy;
pub mod pipeline;
pub mod record;
pub mod timestamp;

pub use config::LoggerConfig;
pub use context::{ContextGuard, LoggerContext};
pub use environment::Environment;
pub use error::{LoggerError, Result};
pub use field::FieldValue;
pub use hook::{Hook, HookStage};
pub use level::Level;
pub use logger::{FatalHandler, Logger, LoggerBuilder};
pub use overflow_policy::{LogPriority, OverflowCallback, OverflowPolicy};
pub use pipeline::{LevelGate, Outcome, Pipeline, PipelineState, Stage};
pub use record::{DisplayHints, Record, RecordError};
pub use timestamp::TimestampFormat;
