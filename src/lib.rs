//! # logz
//!
//! A structured logging core: leveled records flow through a formatting
//! pipeline into pluggable writers, with optional remote notifiers and a
//! scrapeable metrics registry.
//!
//! ## Features
//!
//! - **Structured Records**: tags, typed fields, error chains and display hints
//! - **Formatters**: text, json, yaml, xml, csv, pretty and minimal
//! - **Writers**: console, file, rotating file, buffered, network, fan-out
//! - **Notifiers**: HTTP webhooks, WebSocket and desktop notifications
//! - **Thread Safe**: one logger is shared freely between threads
//!
//! ```
//! use logz::prelude::*;
//!
//! let out = MemoryWriter::new();
//! let logger = Logger::builder()
//!     .formatter(Formatter::from_name("json").unwrap())
//!     .writer(out.clone())
//!     .build();
//!
//! logger.info("service started");
//! assert!(out.text().contains(r#""msg":"service started""#));
//! ```

pub mod bridge;
pub mod core;
pub mod formatters;
pub mod macros;
pub mod metrics;
pub mod notifiers;
pub mod writers;

pub use crate::core::pipeline;

pub mod prelude {
    pub use crate::bridge::IoBridge;
    pub use crate::core::{
        FieldValue, Hook, HookStage, Level, Logger, LoggerBuilder, LoggerConfig, LoggerContext,
        LoggerError, Outcome, Record, Result,
    };
    pub use crate::formatters::Formatter;
    pub use crate::metrics::MetricsRegistry;
    pub use crate::notifiers::{Notifier, NotifierConfig, NotifierRegistry};
    pub use crate::writers::{IoWriter, MemoryWriter, MultiWriter, Writer};
}

pub use crate::core::{
    ContextGuard, DisplayHints, Environment, FatalHandler, FieldValue, Hook, HookStage, Level,
    LogPriority, LoggerBuilder, LoggerConfig, LoggerContext, LoggerError, Logger, Outcome,
    OverflowCallback, OverflowPolicy, Record, RecordError, Result, TimestampFormat,
};
pub use crate::formatters::{Formatter, JsonFormatter, TextFormatter};
pub use crate::metrics::MetricsRegistry;
