//! Logging macros for ergonomic log message formatting.
//!
//! These macros check [`Logger::enabled`](crate::Logger::enabled) before
//! formatting, so disabled levels cost one atomic load.
//!
//! # Examples
//!
//! ```
//! use logz::prelude::*;
//! use logz::info;
//!
//! let out = MemoryWriter::new();
//! let logger = Logger::builder().writer(out.clone()).build();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! assert_eq!(out.lines().len(), 2);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use logz::prelude::*;
/// # let logger = Logger::builder().writer(MemoryWriter::new()).build();
/// use logz::log;
/// log!(logger, Level::Info, "Simple message");
/// log!(logger, Level::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let level: $crate::Level = $level;
        if $logger.enabled(level) {
            $logger.log_message(level, format!($($arg)+));
        }
    }};
}

/// Log a trace-level message.
///
/// ```
/// # use logz::prelude::*;
/// # let logger = Logger::builder().min_level(Level::Trace).writer(MemoryWriter::new()).build();
/// use logz::trace;
/// trace!(logger, "Entering function: calculate()");
/// trace!(logger, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! notice {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Notice, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Log a success-level message.
///
/// ```
/// # use logz::prelude::*;
/// # let logger = Logger::builder().writer(MemoryWriter::new()).build();
/// use logz::success;
/// success!(logger, "Migrated {} rows", 1200);
/// ```
#[macro_export]
macro_rules! success {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Success, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! alert {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Alert, $($arg)+)
    };
}

/// Log an error-level message.
///
/// ```
/// # use logz::prelude::*;
/// # let logger = Logger::builder().writer(MemoryWriter::new()).build();
/// use logz::error;
/// let err = std::io::Error::new(std::io::ErrorKind::NotFound, "config.yaml");
/// error!(logger, "Failed to load configuration: {}", err);
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Critical, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::writers::MemoryWriter;
    use crate::{Level, Logger};

    #[test]
    fn test_macros_format_and_gate() {
        let out = MemoryWriter::new();
        let logger = Logger::builder()
            .formatter(crate::Formatter::from_name("minimal").unwrap())
            .writer(out.clone())
            .build();

        info!(logger, "port {}", 8080);
        debug!(logger, "hidden {}", 1);
        warn!(logger, "disk {}%", 91);
        log!(logger, Level::Alert, "raw");
        critical!(logger, "down");

        assert_eq!(out.lines(), vec!["INFO port 8080", "WARN disk 91%", "ALERT raw", "CRITICAL down"]);
    }

    #[test]
    fn test_macro_accepts_references() {
        let out = MemoryWriter::new();
        let logger = std::sync::Arc::new(Logger::builder().writer(out.clone()).build());
        let shared = &logger;
        success!(shared, "ok");
        notice!(shared, "not shown");
        trace!(shared, "not shown");
        alert!(shared, "shown");
        error!(shared, "shown");
        assert_eq!(out.lines().len(), 3);
    }
}
