//! Recorded action shapes (spec §3 `Action`, §4.7).

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct Action {
    pub seq: u64,
    pub timestamp_ms: u64,
    pub tab_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub target: Option<Value>,
    pub value: Option<Value>,
    pub screenshot: Option<String>,
}

impl Action {
    pub fn from_captured(seq: u64, timestamp_ms: u64, tab_id: &str, raw: Value, screenshot: Option<String>) -> Self {
        let kind = raw.get("type").and_then(Value::as_str).unwrap_or("annotation").to_string();
        let target = raw.get("target").cloned();
        let value = raw.get("value").cloned();
        Self { seq, timestamp_ms, tab_id: tab_id.to_string(), kind, target, value, screenshot }
    }

    pub fn synthetic(seq: u64, timestamp_ms: u64, tab_id: &str, kind: &str) -> Self {
        Self {
            seq,
            timestamp_ms,
            tab_id: tab_id.to_string(),
            kind: kind.to_string(),
            target: None,
            value: None,
            screenshot: None,
        }
    }

    pub fn annotation(seq: u64, timestamp_ms: u64, tab_id: &str, text: &str) -> Self {
        Self {
            seq,
            timestamp_ms,
            tab_id: tab_id.to_string(),
            kind: "annotation".to_string(),
            target: None,
            value: Some(Value::String(text.to_string())),
            screenshot: None,
        }
    }
}
