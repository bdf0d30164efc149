//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Record carries no usable level
    #[error("Invalid level: record has no level")]
    InvalidLevel,

    /// Record message is empty
    #[error("Missing message: record message is empty")]
    MissingMessage,

    /// Cached severity does not agree with the level
    #[error("Invalid severity {severity} for level '{level}'")]
    InvalidSeverity { level: String, severity: i32 },

    /// Formatter rejected the record
    #[error("Format failed ({format}): {message}")]
    FormatFailed { format: String, message: String },

    /// Destination rejected the bytes
    #[error("Write failed on {writer}: {message}")]
    WriteFailed { writer: String, message: String },

    /// Notifier could not reach its remote end
    #[error("Transport error in notifier '{notifier}': {message}")]
    Transport { notifier: String, message: String },

    /// Notifier reached its remote end but got a non-2xx answer
    #[error("Notifier '{notifier}' received bad status {status}")]
    BadStatus { notifier: String, status: u16 },

    /// Record already went through the pipeline
    #[error("Pipeline already reached a terminal state for this record")]
    Terminal,

    /// Cancel bit was observed at a stage boundary
    #[error("Pipeline cancelled before stage '{stage}'")]
    Cancelled { stage: &'static str },

    /// Hook aborted the pipeline
    #[error("Hook failed: {message}")]
    Hook { message: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotation { path: String, message: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    pub fn invalid_severity(level: impl Into<String>, severity: i32) -> Self {
        LoggerError::InvalidSeverity {
            level: level.into(),
            severity,
        }
    }

    pub fn format_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn write_failed(writer: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::WriteFailed {
            writer: writer.into(),
            message: message.into(),
        }
    }

    pub fn transport(notifier: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Transport {
            notifier: notifier.into(),
            message: message.into(),
        }
    }

    pub fn bad_status(notifier: impl Into<String>, status: u16) -> Self {
        LoggerError::BadStatus {
            notifier: notifier.into(),
            status,
        }
    }

    pub fn hook<S: Into<String>>(message: S) -> Self {
        LoggerError::Hook {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// True for the three record validation kinds
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LoggerError::InvalidLevel
                | LoggerError::MissingMessage
                | LoggerError::InvalidSeverity { .. }
        )
    }

    /// True for per-notifier network failures
    pub fn is_notifier_failure(&self) -> bool {
        matches!(
            self,
            LoggerError::Transport { .. } | LoggerError::BadStatus { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::write_failed("file", "disk full");
        assert!(matches!(err, LoggerError::WriteFailed { .. }));

        let err = LoggerError::config("rotating", "max size must be positive");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::bad_status("ops", 503);
        assert!(err.is_notifier_failure());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::file_rotation("/var/log/app.log", "Disk full");
        assert_eq!(
            err.to_string(),
            "File rotation failed for '/var/log/app.log': Disk full"
        );

        let err = LoggerError::format_failed("yaml", "unsupported value");
        assert_eq!(err.to_string(), "Format failed (yaml): unsupported value");

        let err = LoggerError::invalid_severity("info", 0);
        assert_eq!(err.to_string(), "Invalid severity 0 for level 'info'");
    }

    #[test]
    fn test_validation_kinds() {
        assert!(LoggerError::InvalidLevel.is_validation());
        assert!(LoggerError::MissingMessage.is_validation());
        assert!(LoggerError::invalid_severity("warn", -1).is_validation());
        assert!(!LoggerError::Terminal.is_validation());
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("writing log file", "cannot write to file", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("writing log file"));
        assert!(err.to_string().contains("cannot write to file"));
    }
}
