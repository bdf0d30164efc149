//! Remote notification sinks
//!
//! A [`Notifier`] delivers one record to a remote system. The transport is a
//! closed set (HTTP webhook, WebSocket, desktop bus); filtering and the
//! enabled flag are shared by all of them.

mod desktop;
mod http;
mod payload;
mod registry;
mod websocket;

pub use desktop::DesktopNotifier;
pub use http::HttpNotifier;
pub use payload::Payload;
pub use registry::{NotifierDescription, NotifierRegistry};
pub use websocket::WebSocketNotifier;

use crate::core::error::{LoggerError, Result};
use crate::core::level::Level;
use crate::core::record::Record;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Upper bound on one network delivery
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub enum NotifierKind {
    Http(HttpNotifier),
    WebSocket(WebSocketNotifier),
    Desktop(DesktopNotifier),
}

impl NotifierKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NotifierKind::Http(_) => "http",
            NotifierKind::WebSocket(_) => "websocket",
            NotifierKind::Desktop(_) => "dbus",
        }
    }
}

/// Which records a notifier forwards
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifierFilter {
    /// Only records of exactly this level
    pub level: Option<Level>,
    /// Only records from these sources; empty accepts any source
    pub sources: Vec<String>,
}

impl NotifierFilter {
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(level) = self.level {
            if record.level != level {
                return false;
            }
        }
        if self.sources.is_empty() {
            return true;
        }
        record
            .source
            .as_deref()
            .is_some_and(|source| self.sources.iter().any(|s| s == source))
    }
}

/// Configuration of one notifier entry
///
/// ```
/// use logz::notifiers::NotifierConfig;
///
/// let config: NotifierConfig = serde_json::from_str(
///     r#"{"type": "http", "webhook_url": "https://hooks.example.com/x", "level": "error"}"#,
/// ).unwrap();
/// assert_eq!(config.http_method, "POST");
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default = "default_http_method")]
    pub http_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

fn default_http_method() -> String {
    "POST".to_string()
}

fn default_enabled() -> bool {
    true
}

impl NotifierConfig {
    fn empty(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            webhook_url: None,
            auth_token: None,
            http_method: default_http_method(),
            endpoint: None,
            enabled: true,
            level: None,
            sources: Vec::new(),
        }
    }

    pub fn http(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: Some(webhook_url.into()),
            ..Self::empty("http")
        }
    }

    pub fn websocket(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Self::empty("websocket")
        }
    }

    pub fn dbus() -> Self {
        Self::empty("dbus")
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    #[must_use]
    pub fn with_sources<S: Into<String>>(mut self, sources: impl IntoIterator<Item = S>) -> Self {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// A named remote sink with its filter and enabled flag
#[derive(Debug)]
pub struct Notifier {
    name: String,
    kind: NotifierKind,
    filter: NotifierFilter,
    enabled: AtomicBool,
    config: Option<NotifierConfig>,
}

impl Notifier {
    pub fn new(name: impl Into<String>, kind: NotifierKind) -> Self {
        Self {
            name: name.into(),
            kind,
            filter: NotifierFilter::default(),
            enabled: AtomicBool::new(true),
            config: None,
        }
    }

    /// Build from a configuration entry; an unknown `type` is an error
    pub fn from_config(name: impl Into<String>, config: &NotifierConfig) -> Result<Self> {
        let name = name.into();
        let kind = match config.kind.trim().to_ascii_lowercase().as_str() {
            "http" => NotifierKind::Http(HttpNotifier::new(
                config.webhook_url.clone().unwrap_or_default(),
                config.auth_token.clone(),
                &config.http_method,
            )?),
            "websocket" => NotifierKind::WebSocket(WebSocketNotifier::new(
                config.endpoint.clone().unwrap_or_default(),
            )?),
            "dbus" => NotifierKind::Desktop(DesktopNotifier::new()),
            other => {
                return Err(LoggerError::config(
                    format!("notifier '{}'", name),
                    format!("unknown notifier type '{}'", other),
                ))
            }
        };

        let filter = NotifierFilter {
            level: config
                .level
                .as_deref()
                .filter(|l| !l.trim().is_empty())
                .map(Level::parse),
            sources: config.sources.clone(),
        };
        let notifier = Self::new(name, kind).with_filter(filter);
        notifier.enabled.store(config.enabled, Ordering::Release);
        Ok(Self {
            config: Some(config.clone()),
            ..notifier
        })
    }

    #[must_use]
    pub fn with_filter(mut self, filter: NotifierFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NotifierKind {
        &self.kind
    }

    pub fn filter(&self) -> &NotifierFilter {
        &self.filter
    }

    /// Configuration this notifier was built from, if any
    pub fn config(&self) -> Option<&NotifierConfig> {
        self.config.as_ref()
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Whether `notify` would actually send this record
    pub fn accepts(&self, record: &Record) -> bool {
        self.is_enabled() && self.filter.matches(record)
    }

    /// Deliver one record; filtered-out records succeed without sending
    pub fn notify(&self, record: &Record) -> Result<()> {
        if !self.accepts(record) {
            return Ok(());
        }
        match &self.kind {
            NotifierKind::Http(http) => http.send(&self.name, &Payload::from_record(record)),
            NotifierKind::WebSocket(ws) => ws.send(&self.name, &Payload::from_record(record)),
            NotifierKind::Desktop(desktop) => desktop.send(&self.name, record),
        }
    }
}
