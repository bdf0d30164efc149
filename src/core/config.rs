//! Logger configuration
//!
//! A [`LoggerConfig`] is what a loader hands to the library: option groups
//! deserialized from JSON or YAML, optionally overlaid with environment
//! variables, then realized into a [`Logger`] with [`LoggerConfig::build`].

use super::error::{LoggerError, Result};
use super::hook::HookStage;
use super::level::Level;
use super::logger::Logger;
use super::record::Record;
use crate::formatters::Formatter;
use crate::metrics::MetricsRegistry;
use crate::notifiers::{NotifierDescription, NotifierRegistry};
use crate::writers::{
    BufferedWriter, DiscardWriter, IoWriter, MultiWriter, NetworkWriter, RotatingFileWriter,
    RotationPolicy, Writer,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Every option accepted by [`LoggerConfig::apply_option`]
pub const OPTION_NAMES: [&str; 23] = [
    "debug",
    "show_color",
    "show_icons",
    "prefix",
    "formatter",
    "output",
    "min_level",
    "max_level",
    "level",
    "output_tty",
    "output_file",
    "output_syslog",
    "stack_trace",
    "rotate",
    "rotate_max_size",
    "rotate_max_back",
    "rotate_max_age",
    "compress",
    "buffer_size",
    "flush_interval",
    "metrics",
    "metrics_port",
    "metrics_whitelist",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Lowers the default minimum level to `debug`
    pub debug: bool,
    /// Force color on or off; unset follows the record hints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_color: Option<bool>,
    /// Force icons on or off; unset follows the record hints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_icons: Option<bool>,
    /// Environment variable prefix used by [`LoggerConfig::apply_env`]
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub formatter: String,
    /// `stdout`, `stderr`, `none`, or a file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_level: Option<String>,
    /// Alias of `min_level`, used when `min_level` is absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            formatter: "text".to_string(),
            output: None,
            min_level: None,
            max_level: None,
            level: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_tty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    /// `udp://host:port`, `tcp://host:port` or `host:port`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_syslog: Option<String>,
    /// Render error chains on every record
    pub stack_trace: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotatingConfig {
    pub rotate: bool,
    pub rotate_max_size: u64,
    pub rotate_max_back: usize,
    #[serde(with = "humantime_opt", skip_serializing_if = "Option::is_none")]
    pub rotate_max_age: Option<Duration>,
    pub compress: bool,
}

impl Default for RotatingConfig {
    fn default() -> Self {
        let policy = RotationPolicy::default();
        Self {
            rotate: false,
            rotate_max_size: policy.max_size,
            rotate_max_back: policy.max_backups,
            rotate_max_age: None,
            compress: false,
        }
    }
}

impl RotatingConfig {
    pub fn policy(&self) -> RotationPolicy {
        let policy = RotationPolicy::new()
            .with_max_size(self.rotate_max_size)
            .with_max_backups(self.rotate_max_back)
            .with_compression(self.compress);
        match self.rotate_max_age {
            Some(age) => policy.with_max_age(age),
            None => policy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferingConfig {
    /// Bytes coalesced before writing; 0 writes synchronously
    pub buffer_size: usize,
    #[serde(with = "humantime_serde_duration")]
    pub flush_interval: Duration,
}

impl Default for BufferingConfig {
    fn default() -> Self {
        Self {
            buffer_size: 0,
            flush_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Count records in the process-wide metrics registry
    pub enabled: bool,
    /// Serve the registry for scraping on this port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub whitelist: Vec<String>,
}

/// Fully realized logger configuration.
///
/// ```
/// use logz::{Level, LoggerConfig};
///
/// let mut config = LoggerConfig::from_yaml_str(
///     r#"
/// format:
///   formatter: json
///   level: warn
/// rotating:
///   rotate_max_age: 7d
/// "#,
/// )
/// .unwrap();
/// assert_eq!(config.min_level().unwrap(), Level::Warn);
///
/// config.apply_env_with("APP", |key| (key == "APP_MIN_LEVEL").then(|| "error".to_string())).unwrap();
/// assert_eq!(config.min_level().unwrap(), Level::Error);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub general: GeneralConfig,
    pub format: FormatConfig,
    pub output: OutputConfig,
    pub rotating: RotatingConfig,
    pub buffering: BufferingConfig,
    #[serde(skip_serializing_if = "NotifierDescription::is_empty")]
    pub notifiers: NotifierDescription,
    pub metrics: MetricsConfig,
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| LoggerError::config("configuration", e.to_string()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| LoggerError::config("configuration", e.to_string()))
    }

    /// Set one option from its string form.
    ///
    /// Returns `Ok(false)` for an unknown option name, which is ignored.
    pub fn apply_option(&mut self, name: &str, raw: &str) -> Result<bool> {
        let raw = raw.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => self.general.debug = parse_bool(name, raw)?,
            "show_color" => self.general.show_color = Some(parse_bool(name, raw)?),
            "show_icons" => self.general.show_icons = Some(parse_bool(name, raw)?),
            "prefix" => self.general.prefix = raw.to_string(),
            "formatter" => {
                Formatter::from_name(raw)?;
                self.format.formatter = raw.to_ascii_lowercase();
            }
            "output" => self.format.output = non_empty(raw),
            "min_level" => self.format.min_level = Some(parse_level(name, raw)?.to_str().into()),
            "max_level" => self.format.max_level = Some(parse_level(name, raw)?.to_str().into()),
            "level" => self.format.level = Some(parse_level(name, raw)?.to_str().into()),
            "output_tty" => self.output.output_tty = parse_bool(name, raw)?,
            "output_file" => self.output.output_file = non_empty(raw).map(PathBuf::from),
            "output_syslog" => self.output.output_syslog = non_empty(raw),
            "stack_trace" => self.output.stack_trace = parse_bool(name, raw)?,
            "rotate" => self.rotating.rotate = parse_bool(name, raw)?,
            "rotate_max_size" => self.rotating.rotate_max_size = parse_size(name, raw)?,
            "rotate_max_back" => self.rotating.rotate_max_back = parse_number(name, raw)?,
            "rotate_max_age" => {
                self.rotating.rotate_max_age = if raw.is_empty() {
                    None
                } else {
                    Some(parse_duration(name, raw)?)
                }
            }
            "compress" => self.rotating.compress = parse_bool(name, raw)?,
            "buffer_size" => self.buffering.buffer_size = parse_size(name, raw)? as usize,
            "flush_interval" => self.buffering.flush_interval = parse_duration(name, raw)?,
            "metrics" => self.metrics.enabled = parse_bool(name, raw)?,
            "metrics_port" => self.metrics.port = Some(parse_number(name, raw)?),
            "metrics_whitelist" => {
                self.metrics.whitelist = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Overlay `<PREFIX>_<OPTION>` variables from the process environment
    pub fn apply_env(&mut self, prefix: &str) -> Result<()> {
        self.apply_env_with(prefix, |key| std::env::var(key).ok())
    }

    /// Overlay options from `lookup`; absent keys keep the structured value
    pub fn apply_env_with<F>(&mut self, prefix: &str, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = prefix.trim_end_matches('_').to_ascii_uppercase();
        for option in OPTION_NAMES {
            let key = if prefix.is_empty() {
                option.to_ascii_uppercase()
            } else {
                format!("{}_{}", prefix, option.to_ascii_uppercase())
            };
            if let Some(value) = lookup(&key) {
                self.apply_option(option, &value).map_err(|e| {
                    LoggerError::config(key.clone(), e.to_string())
                })?;
            }
        }
        Ok(())
    }

    /// Effective minimum level: `min_level`, then `level`, then `debug`
    pub fn min_level(&self) -> Result<Level> {
        match self.format.min_level.as_deref().or(self.format.level.as_deref()) {
            Some(raw) => parse_level("min_level", raw),
            None if self.general.debug => Ok(Level::Debug),
            None => Ok(Level::Info),
        }
    }

    pub fn max_level(&self) -> Result<Option<Level>> {
        self.format
            .max_level
            .as_deref()
            .map(|raw| parse_level("max_level", raw))
            .transpose()
    }

    pub fn formatter(&self) -> Result<Formatter> {
        let formatter = Formatter::from_name(&self.format.formatter)?;
        Ok(match formatter {
            Formatter::Text(mut text) => {
                text.force_color = self.general.show_color;
                text.force_icons = self.general.show_icons;
                Formatter::Text(text)
            }
            other => other,
        })
    }

    /// Realize the configuration into a logger.
    ///
    /// Local destinations are combined in the order output, tty, file,
    /// syslog; with none configured the logger writes to stdout. Notifiers
    /// are attached after the local destinations.
    pub fn build(&self) -> Result<Logger> {
        let metrics = if self.metrics.enabled || self.metrics.port.is_some() {
            let metrics = MetricsRegistry::global();
            if !self.metrics.whitelist.is_empty() {
                metrics.set_export_whitelist(self.metrics.whitelist.iter().cloned());
            }
            if let Some(port) = self.metrics.port {
                metrics.enable(port)?;
            }
            Some(metrics)
        } else {
            None
        };

        let mut local = self.local_writers()?;
        let mut output: Arc<dyn Writer> = match local.len() {
            0 => Arc::new(IoWriter::stdout()),
            1 => local.remove(0),
            _ => Arc::new(MultiWriter::new(local)),
        };
        if self.buffering.buffer_size > 0 {
            let mut builder = BufferedWriter::builder()
                .buffer_size(self.buffering.buffer_size)
                .flush_interval(self.buffering.flush_interval);
            if let Some(metrics) = &metrics {
                builder = builder.metrics(Arc::clone(metrics));
            }
            output = Arc::new(builder.build(output)?);
        }

        let mut builder = Logger::builder()
            .min_level(self.min_level()?)
            .formatter(self.formatter()?)
            .shared_writer(output);
        if let Some(max) = self.max_level()? {
            builder = builder.max_level(max);
        }
        if self.output.stack_trace {
            builder = builder.hook(|stage: HookStage, record: &mut Record| -> Result<()> {
                if stage == HookStage::PreFormat {
                    record.hints.show_stack = true;
                }
                Ok(())
            });
        }
        if let Some(metrics) = metrics {
            builder = builder.metrics(metrics);
        }
        if !self.notifiers.is_empty() {
            let registry = Arc::new(NotifierRegistry::new());
            registry.update_from_config(&self.notifiers);
            builder = builder.notifiers(registry);
        }
        Ok(builder.build())
    }

    fn local_writers(&self) -> Result<Vec<Arc<dyn Writer>>> {
        let mut writers: Vec<Arc<dyn Writer>> = Vec::new();
        let mut has_stdout = false;

        if let Some(descriptor) = self.format.output.as_deref() {
            match descriptor.trim().to_ascii_lowercase().as_str() {
                "stdout" | "-" => {
                    has_stdout = true;
                    writers.push(Arc::new(IoWriter::stdout()));
                }
                "stderr" => writers.push(Arc::new(IoWriter::stderr())),
                "none" | "discard" => writers.push(Arc::new(DiscardWriter)),
                _ => writers.push(self.file_writer(PathBuf::from(descriptor.trim()))?),
            }
        }
        if self.output.output_tty && !has_stdout {
            writers.push(Arc::new(IoWriter::stdout()));
        }
        if let Some(path) = &self.output.output_file {
            writers.push(self.file_writer(path.clone())?);
        }
        if let Some(address) = &self.output.output_syslog {
            writers.push(Arc::new(NetworkWriter::new(address)?));
        }
        Ok(writers)
    }

    fn file_writer(&self, path: PathBuf) -> Result<Arc<dyn Writer>> {
        if self.rotating.rotate {
            Ok(Arc::new(RotatingFileWriter::new(path, self.rotating.policy())?))
        } else {
            Ok(Arc::new(IoWriter::file(path)?))
        }
    }
}

fn non_empty(raw: &str) -> Option<String> {
    (!raw.is_empty()).then(|| raw.to_string())
}

fn invalid(option: &str, raw: &str, expected: &str) -> LoggerError {
    LoggerError::config(
        format!("option '{}'", option),
        format!("cannot parse '{}' as {}", raw, expected),
    )
}

fn parse_bool(option: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(option, raw, "a boolean")),
    }
}

fn parse_level(option: &str, raw: &str) -> Result<Level> {
    let level = Level::parse(raw);
    if level == Level::Silent && !raw.trim().eq_ignore_ascii_case("silent") {
        return Err(invalid(option, raw, "a level name"));
    }
    Ok(level)
}

fn parse_number<T: std::str::FromStr>(option: &str, raw: &str) -> Result<T> {
    raw.parse().map_err(|_| invalid(option, raw, "a number"))
}

fn parse_duration(option: &str, raw: &str) -> Result<Duration> {
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(raw).map_err(|_| invalid(option, raw, "a duration"))
}

/// Bytes, optionally with a binary `K`/`M`/`G` suffix (`10MB`, `512k`)
fn parse_size(option: &str, raw: &str) -> Result<u64> {
    let upper = raw.trim().to_ascii_uppercase();
    let digits = upper.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let unit = upper[digits.len()..].trim_end_matches('B');
    let multiplier: u64 = match unit {
        "" => 1,
        "K" | "KI" => 1024,
        "M" | "MI" => 1024 * 1024,
        "G" | "GI" => 1024 * 1024 * 1024,
        _ => return Err(invalid(option, raw, "a size")),
    };
    digits
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| invalid(option, raw, "a size"))
}

/// `Duration` as a humantime string, also accepting plain seconds
mod humantime_serde_duration {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    pub(super) enum Raw {
        Seconds(u64),
        Text(String),
    }

    pub(super) fn parse<E: Error>(raw: Raw) -> Result<Duration, E> {
        match raw {
            Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
            Raw::Text(text) => humantime::parse_duration(&text).map_err(E::custom),
        }
    }

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        parse(Raw::deserialize(deserializer)?)
    }
}

mod humantime_opt {
    use super::humantime_serde_duration::{parse, Raw};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Option::<Raw>::deserialize(deserializer)?
            .map(parse)
            .transpose()
    }
}
