pub mod accessibility;
pub mod batch;
pub mod cookies;
pub mod evaluate;
pub mod interaction;
pub mod learn;
pub mod navigation;
pub mod screenshot;
pub mod sessions;
pub mod tabs;

use serde_json::Value;

use crate::error::BrowserError;

pub(crate) fn require_str<'a>(params: &'a Value, field: &str) -> Result<&'a str, BrowserError> {
    params
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| BrowserError::invalid_params(format!("missing required field: {field}")))
}

pub(crate) fn optional_str<'a>(params: &'a Value, field: &str) -> Option<&'a str> {
    params.get(field).and_then(Value::as_str)
}

pub(crate) fn optional_u64(params: &Value, field: &str) -> Option<u64> {
    params.get(field).and_then(Value::as_u64)
}

pub(crate) fn optional_f64(params: &Value, field: &str) -> Option<f64> {
    params.get(field).and_then(Value::as_f64)
}

pub(crate) fn tab_id(params: &Value) -> Result<&str, BrowserError> {
    require_str(params, "tabId")
}
