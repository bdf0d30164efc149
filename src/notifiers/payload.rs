use crate::core::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON body delivered by the HTTP and WebSocket notifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub timestamp: String,
    pub level: String,
    pub message: String,
    /// Fields plus `tags`, `context`, `trace_id`, `caller` and `error` when
    /// present; `null` when there is nothing to report
    pub metadata: Option<Map<String, Value>>,
    pub source: String,
}

impl Payload {
    pub fn from_record(record: &Record) -> Self {
        let mut metadata: Map<String, Value> = record
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json_value()))
            .collect();

        if !record.tags.is_empty() {
            let tags = record
                .tags
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            metadata.insert("tags".into(), Value::Object(tags));
        }
        let correlation = [
            ("context", record.context.as_deref()),
            ("trace_id", record.trace_id.as_deref()),
            ("caller", record.caller.as_deref()),
            ("error", record.error.as_ref().map(|e| e.message.as_str())),
        ];
        for (key, value) in correlation {
            if let Some(value) = value {
                metadata.insert(key.into(), Value::String(value.to_string()));
            }
        }

        Self {
            timestamp: record.timestamp_rfc3339(),
            level: record.level.to_str().to_string(),
            message: record.message.clone(),
            metadata: (!metadata.is_empty()).then_some(metadata),
            source: record.source.clone().unwrap_or_default(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
